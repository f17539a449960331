//! Map state: regions, cities, and trade lanes.
//!
//! Owns the lane lifecycle operations (purchase, sale, carrier assignment,
//! event-driven blocking, upgrades), the daily condition drift, and the
//! memoized direct-connection lookup.
//!
//! There is deliberately no multi-hop pathfinding: `connection_between`
//! answers "is there a direct lane between these two cities" and nothing
//! more. The cache is keyed by the unordered city pair and rebuilt from
//! scratch on restore.

use crate::models::lane::{Lane, LaneError, LaneUpgrade};
use crate::models::notification::{Notification, NotificationLog};
use crate::models::region::{City, Region};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Fraction of base cost returned when a lane is sold.
pub const LANE_RESALE_FACTOR: f64 = 0.7;

/// Map operation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    #[error("Unknown lane: {0}")]
    UnknownLane(String),

    #[error("Unknown city: {0}")]
    UnknownCity(String),

    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    #[error(transparent)]
    Lane(#[from] LaneError),
}

/// A lane whose carrier assignment was cleared by a block.
#[derive(Debug, Clone, PartialEq)]
pub struct DisruptedAssignment {
    pub lane_id: String,
    pub carrier_id: String,
}

/// The lane network and its condition state.
#[derive(Debug, Clone, Default)]
pub struct MapState {
    regions: BTreeMap<String, Region>,
    cities: BTreeMap<String, City>,
    lanes: BTreeMap<String, Lane>,
    /// Unordered city pair → direct lane id (None = known disconnected).
    /// Derived state: never snapshotted, cleared on mutation.
    connection_cache: HashMap<(String, String), Option<String>>,
}

impl MapState {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Registration and access
    // ========================================================================

    pub fn add_region(&mut self, region: Region) {
        self.regions.insert(region.id().to_string(), region);
    }

    /// Add a city and register it with its region.
    pub fn add_city(&mut self, city: City) -> Result<(), MapError> {
        let region = self
            .regions
            .get_mut(city.region_id())
            .ok_or_else(|| MapError::UnknownRegion(city.region_id().to_string()))?;
        region.add_city(city.id());
        self.cities.insert(city.id().to_string(), city);
        Ok(())
    }

    pub fn add_lane(&mut self, lane: Lane) {
        self.connection_cache.clear();
        self.lanes.insert(lane.id().to_string(), lane);
    }

    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions.get(id)
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    pub fn region_ids(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(|s| s.as_str())
    }

    /// Ids of lanes touching any city of the given region.
    pub fn lanes_in_region(&self, region_id: &str) -> Vec<String> {
        self.lanes
            .values()
            .filter(|lane| {
                [lane.start_city(), lane.end_city()].iter().any(|city_id| {
                    self.cities
                        .get(*city_id)
                        .map(|c| c.region_id() == region_id)
                        .unwrap_or(false)
                })
            })
            .map(|lane| lane.id().to_string())
            .collect()
    }

    pub fn city(&self, id: &str) -> Option<&City> {
        self.cities.get(id)
    }

    pub fn lane(&self, id: &str) -> Option<&Lane> {
        self.lanes.get(id)
    }

    pub fn lane_mut(&mut self, id: &str) -> Option<&mut Lane> {
        self.lanes.get_mut(id)
    }

    pub fn lanes(&self) -> impl Iterator<Item = &Lane> {
        self.lanes.values()
    }

    pub fn lane_ids(&self) -> impl Iterator<Item = &str> {
        self.lanes.keys().map(|s| s.as_str())
    }

    pub fn owned_lanes(&self) -> impl Iterator<Item = &Lane> {
        self.lanes.values().filter(|l| l.is_owned())
    }

    /// Region id a lane belongs to, via its start city.
    pub fn lane_region(&self, lane_id: &str) -> Option<&str> {
        let lane = self.lanes.get(lane_id)?;
        self.cities.get(lane.start_city()).map(|c| c.region_id())
    }

    // ========================================================================
    // Lane lifecycle
    // ========================================================================

    /// Purchase a lane. Returns the purchase cost (charged by the caller
    /// before invoking this; the map itself holds no money).
    pub fn purchase_lane(&mut self, lane_id: &str) -> Result<i64, MapError> {
        let lane = self
            .lanes
            .get_mut(lane_id)
            .ok_or_else(|| MapError::UnknownLane(lane_id.to_string()))?;
        lane.purchase()?;
        Ok(lane.base_cost())
    }

    /// Sell a lane. Rejected while a carrier is assigned. Returns the
    /// resale proceeds.
    pub fn sell_lane(&mut self, lane_id: &str) -> Result<i64, MapError> {
        let lane = self
            .lanes
            .get_mut(lane_id)
            .ok_or_else(|| MapError::UnknownLane(lane_id.to_string()))?;
        lane.sell()?;
        Ok((lane.base_cost() as f64 * LANE_RESALE_FACTOR).round() as i64)
    }

    pub fn assign_carrier(&mut self, lane_id: &str, carrier_id: &str) -> Result<(), MapError> {
        let lane = self
            .lanes
            .get_mut(lane_id)
            .ok_or_else(|| MapError::UnknownLane(lane_id.to_string()))?;
        lane.assign_carrier(carrier_id)?;
        Ok(())
    }

    pub fn unassign_carrier(&mut self, lane_id: &str) -> Result<String, MapError> {
        let lane = self
            .lanes
            .get_mut(lane_id)
            .ok_or_else(|| MapError::UnknownLane(lane_id.to_string()))?;
        Ok(lane.unassign_carrier()?)
    }

    /// Block every lane touching the given regions for `duration_days`.
    ///
    /// Assigned carriers are force-unassigned atomically with the block;
    /// the returned list lets the caller notify the carrier engine within
    /// the same tick.
    pub fn block_lanes(&mut self, region_ids: &[String], duration_days: u32) -> Vec<DisruptedAssignment> {
        let mut disrupted = Vec::new();

        let lane_ids: Vec<String> = self.lanes.keys().cloned().collect();
        for lane_id in lane_ids {
            let touches_region = {
                let lane = &self.lanes[&lane_id];
                [lane.start_city(), lane.end_city()].iter().any(|city_id| {
                    self.cities
                        .get(*city_id)
                        .map(|c| region_ids.iter().any(|r| r == c.region_id()))
                        .unwrap_or(false)
                })
            };
            if !touches_region {
                continue;
            }

            let lane = self.lanes.get_mut(&lane_id).expect("lane id from keys");
            if let Some(carrier_id) = lane.block(duration_days) {
                disrupted.push(DisruptedAssignment {
                    lane_id: lane_id.clone(),
                    carrier_id,
                });
            }
        }

        disrupted
    }

    /// Block a single lane, returning the disrupted carrier if any.
    pub fn block_lane(&mut self, lane_id: &str, duration_days: u32) -> Result<Option<String>, MapError> {
        let lane = self
            .lanes
            .get_mut(lane_id)
            .ok_or_else(|| MapError::UnknownLane(lane_id.to_string()))?;
        Ok(lane.block(duration_days))
    }

    /// Apply a one-shot upgrade to an owned lane. Returns the upgrade cost
    /// (charged by the caller). Duplicate upgrades are rejected.
    pub fn apply_lane_upgrade(&mut self, lane_id: &str, upgrade: LaneUpgrade) -> Result<i64, MapError> {
        let lane = self
            .lanes
            .get_mut(lane_id)
            .ok_or_else(|| MapError::UnknownLane(lane_id.to_string()))?;
        if !lane.is_owned() {
            return Err(MapError::Lane(LaneError::NotOwned));
        }
        Ok(lane.apply_upgrade(upgrade)?)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Direct lane between two cities, memoized on the unordered pair.
    ///
    /// Returns `None` when no direct lane exists — there is no multi-hop
    /// routing in the core.
    pub fn connection_between(&mut self, city_a: &str, city_b: &str) -> Option<String> {
        let key = if city_a <= city_b {
            (city_a.to_string(), city_b.to_string())
        } else {
            (city_b.to_string(), city_a.to_string())
        };

        if let Some(cached) = self.connection_cache.get(&key) {
            return cached.clone();
        }

        let found = self
            .lanes
            .values()
            .find(|lane| lane.connects(city_a, city_b))
            .map(|lane| lane.id().to_string());

        self.connection_cache.insert(key, found.clone());
        found
    }

    /// Delivery time over a lane for a carrier speed factor.
    pub fn delivery_time(&self, lane_id: &str, speed_factor: f64) -> Result<f64, MapError> {
        let lane = self
            .lanes
            .get(lane_id)
            .ok_or_else(|| MapError::UnknownLane(lane_id.to_string()))?;
        Ok(lane.delivery_time(speed_factor))
    }

    /// Total daily maintenance across owned lanes.
    pub fn total_maintenance(&self) -> i64 {
        self.owned_lanes().map(|l| l.maintenance_cost()).sum()
    }

    /// Discounted asset value of the owned lane network.
    pub fn asset_value(&self) -> i64 {
        self.owned_lanes()
            .map(|l| (l.base_cost() as f64 * LANE_RESALE_FACTOR).round() as i64)
            .sum()
    }

    // ========================================================================
    // Daily update
    // ========================================================================

    /// Daily pass: decay temp effects and blocks, drift lane conditions
    /// (blocked lanes excluded), and walk city conditions.
    pub fn process_daily_update(&mut self, time: f64, rng: &mut RngManager, log: &mut NotificationLog) {
        let lane_ids: Vec<String> = self.lanes.keys().cloned().collect();

        for lane_id in &lane_ids {
            let lane = self.lanes.get_mut(lane_id).expect("lane id from keys");
            let was_blocked = lane.is_blocked();

            let decayed = lane.decay_daily_effects();

            if was_blocked && !lane.is_blocked() {
                log.push(Notification::LaneStatusChanged {
                    time,
                    lane_id: lane_id.clone(),
                    status: lane.status(),
                });
            }

            let drifted = if lane.is_blocked() {
                false
            } else {
                lane.daily_condition_drift(rng)
            };

            if decayed || drifted {
                log.push(Notification::LaneConditionChanged {
                    time,
                    lane_id: lane_id.clone(),
                    congestion: lane.congestion(),
                    risk: lane.risk(),
                });
            }
        }

        for city in self.cities.values_mut() {
            city.daily_condition_walk(rng);
        }
    }

    // ========================================================================
    // Snapshot
    // ========================================================================

    pub fn to_snapshot(&self) -> MapSnapshot {
        MapSnapshot {
            regions: self.regions.values().cloned().collect(),
            cities: self.cities.values().cloned().collect(),
            lanes: self.lanes.values().cloned().collect(),
        }
    }

    /// Restore from a snapshot. The connection cache is derived state and
    /// starts empty.
    pub fn from_snapshot(snapshot: MapSnapshot) -> Self {
        let mut map = Self::new();
        for region in snapshot.regions {
            map.regions.insert(region.id().to_string(), region);
        }
        for city in snapshot.cities {
            map.cities.insert(city.id().to_string(), city);
        }
        for lane in snapshot.lanes {
            map.lanes.insert(lane.id().to_string(), lane);
        }
        map
    }
}

/// Serialized map state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSnapshot {
    pub regions: Vec<Region>,
    pub cities: Vec<City>,
    pub lanes: Vec<Lane>,
}
