//! Trade lane model
//!
//! A lane connects two cities and carries the player-facing lifecycle
//! (available → owned → assigned/blocked) plus slow-moving condition state:
//! congestion, ordinal risk, cargo restrictions, one-shot upgrades, and
//! at most one temporary congestion effect and one temporary risk effect at
//! a time (a new effect replaces — and first reverts — the old one).
//!
//! # Status invariants
//!
//! - A blocked lane never has a carrier assignment; blocking force-clears
//!   the assignment in the same call and reports the disrupted carrier.
//! - A lane with an active assignment cannot be sold.
//! - Ownership survives blocking: when the block decays the lane returns to
//!   `Owned` (or `Available` if it was never purchased).

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Lane lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaneStatus {
    /// Purchasable, not part of the player network
    Available,
    /// Player-owned, idle
    Owned,
    /// Player-owned with an active carrier assignment
    Assigned,
    /// Temporarily unusable (event-driven), assignment force-cleared
    Blocked,
}

/// Ordinal lane risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Extreme,
}

impl RiskLevel {
    pub fn as_index(self) -> i32 {
        match self {
            RiskLevel::Low => 0,
            RiskLevel::Medium => 1,
            RiskLevel::High => 2,
            RiskLevel::Extreme => 3,
        }
    }

    pub fn from_index(index: i32) -> Self {
        match index.clamp(0, 3) {
            0 => RiskLevel::Low,
            1 => RiskLevel::Medium,
            2 => RiskLevel::High,
            _ => RiskLevel::Extreme,
        }
    }

    /// Step the level up or down, saturating at the bounds.
    pub fn step(self, delta: i32) -> Self {
        Self::from_index(self.as_index() + delta)
    }
}

/// One-shot lane upgrade types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaneUpgrade {
    /// Structural reinforcement: one risk step down
    Reinforcement,
    /// Traffic control systems: congestion −0.2
    TrafficControl,
    /// Security patrols: one risk step down
    SecurityPatrol,
}

impl LaneUpgrade {
    /// Upgrade cost as a fraction of the lane's base cost.
    pub fn cost_factor(self) -> f64 {
        match self {
            LaneUpgrade::Reinforcement => 0.5,
            LaneUpgrade::TrafficControl => 0.3,
            LaneUpgrade::SecurityPatrol => 0.4,
        }
    }
}

/// A temporary condition effect with day-granular decay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempEffect {
    /// Congestion delta or risk steps, depending on the slot
    pub delta: f64,
    /// Remaining whole days before the effect reverts
    pub remaining_days: u32,
}

/// Lane operation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LaneError {
    #[error("Lane is not available for purchase")]
    NotAvailable,

    #[error("Lane is not owned")]
    NotOwned,

    #[error("Lane has an active carrier assignment")]
    CarrierAssigned,

    #[error("Lane already has a carrier assigned: {0}")]
    AlreadyAssigned(String),

    #[error("Lane is blocked")]
    Blocked,

    #[error("No carrier is assigned to this lane")]
    NoAssignment,

    #[error("Upgrade already applied: {0:?}")]
    DuplicateUpgrade(LaneUpgrade),
}

/// A trade lane between two cities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    id: String,
    /// Stored as start/end, but undirected for connection lookup
    start_city: String,
    end_city: String,
    distance: f64,
    /// Purchase price, derived from distance
    base_cost: i64,
    /// Daily upkeep while owned, derived from distance
    maintenance_cost: i64,
    owned: bool,
    assigned_carrier: Option<String>,
    /// Days remaining on an event-driven block; 0 = not blocked
    blocked_remaining_days: u32,
    congestion: f64,
    risk: RiskLevel,
    /// Cargo types that may not travel this lane
    restrictions: HashSet<String>,
    temp_congestion: Option<TempEffect>,
    temp_risk: Option<TempEffect>,
    /// Applied upgrades and their recorded effect magnitude
    upgrades: HashMap<LaneUpgrade, f64>,
}

impl Lane {
    /// Create a new available lane.
    ///
    /// Costs are derived from distance: base cost = distance/100 × 10000,
    /// maintenance = distance/100 × 500.
    ///
    /// # Panics
    /// Panics if `distance` is not strictly positive.
    pub fn new(
        id: impl Into<String>,
        start_city: impl Into<String>,
        end_city: impl Into<String>,
        distance: f64,
        congestion: f64,
        risk: RiskLevel,
    ) -> Self {
        assert!(distance > 0.0, "distance must be positive");
        Self {
            id: id.into(),
            start_city: start_city.into(),
            end_city: end_city.into(),
            distance,
            base_cost: (distance / 100.0 * 10000.0).round() as i64,
            maintenance_cost: (distance / 100.0 * 500.0).round() as i64,
            owned: false,
            assigned_carrier: None,
            blocked_remaining_days: 0,
            congestion: congestion.clamp(0.0, 1.0),
            risk,
            restrictions: HashSet::new(),
            temp_congestion: None,
            temp_risk: None,
            upgrades: HashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn start_city(&self) -> &str {
        &self.start_city
    }

    pub fn end_city(&self) -> &str {
        &self.end_city
    }

    /// True if this lane directly connects the two cities, in either order.
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.start_city == a && self.end_city == b) || (self.start_city == b && self.end_city == a)
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn base_cost(&self) -> i64 {
        self.base_cost
    }

    pub fn maintenance_cost(&self) -> i64 {
        self.maintenance_cost
    }

    /// Current lifecycle status, derived so the blocked/assigned/owned
    /// combinations can never disagree with the underlying fields.
    pub fn status(&self) -> LaneStatus {
        if self.blocked_remaining_days > 0 {
            LaneStatus::Blocked
        } else if self.assigned_carrier.is_some() {
            LaneStatus::Assigned
        } else if self.owned {
            LaneStatus::Owned
        } else {
            LaneStatus::Available
        }
    }

    pub fn is_owned(&self) -> bool {
        self.owned
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked_remaining_days > 0
    }

    pub fn assigned_carrier(&self) -> Option<&str> {
        self.assigned_carrier.as_deref()
    }

    pub fn congestion(&self) -> f64 {
        self.congestion
    }

    pub fn risk(&self) -> RiskLevel {
        self.risk
    }

    pub fn restrictions(&self) -> &HashSet<String> {
        &self.restrictions
    }

    pub fn upgrades(&self) -> &HashMap<LaneUpgrade, f64> {
        &self.upgrades
    }

    pub fn temp_congestion(&self) -> Option<TempEffect> {
        self.temp_congestion
    }

    pub fn temp_risk(&self) -> Option<TempEffect> {
        self.temp_risk
    }

    pub fn is_cargo_allowed(&self, cargo_type: &str) -> bool {
        !self.restrictions.contains(cargo_type)
    }

    pub fn add_restriction(&mut self, cargo_type: impl Into<String>) {
        self.restrictions.insert(cargo_type.into());
    }

    pub fn remove_restriction(&mut self, cargo_type: &str) {
        self.restrictions.remove(cargo_type);
    }

    /// Estimated delivery time in simulated seconds:
    /// (distance/60) × (1 + congestion) / speed_factor.
    pub fn delivery_time(&self, speed_factor: f64) -> f64 {
        let speed = if speed_factor > 0.0 { speed_factor } else { 1.0 };
        (self.distance / 60.0) * (1.0 + self.congestion) / speed
    }

    // ========================================================================
    // Lifecycle transitions
    // ========================================================================

    pub fn purchase(&mut self) -> Result<(), LaneError> {
        if self.owned {
            return Err(LaneError::NotAvailable);
        }
        if self.is_blocked() {
            return Err(LaneError::Blocked);
        }
        self.owned = true;
        Ok(())
    }

    pub fn sell(&mut self) -> Result<(), LaneError> {
        if !self.owned {
            return Err(LaneError::NotOwned);
        }
        if self.assigned_carrier.is_some() {
            return Err(LaneError::CarrierAssigned);
        }
        self.owned = false;
        Ok(())
    }

    pub fn assign_carrier(&mut self, carrier_id: impl Into<String>) -> Result<(), LaneError> {
        if self.is_blocked() {
            return Err(LaneError::Blocked);
        }
        if !self.owned {
            return Err(LaneError::NotOwned);
        }
        if let Some(existing) = &self.assigned_carrier {
            return Err(LaneError::AlreadyAssigned(existing.clone()));
        }
        self.assigned_carrier = Some(carrier_id.into());
        Ok(())
    }

    pub fn unassign_carrier(&mut self) -> Result<String, LaneError> {
        self.assigned_carrier.take().ok_or(LaneError::NoAssignment)
    }

    /// Block the lane for `duration_days`, force-clearing any assignment.
    ///
    /// Returns the disrupted carrier id, if one was assigned, so the caller
    /// can notify the carrier engine within the same tick.
    pub fn block(&mut self, duration_days: u32) -> Option<String> {
        let disrupted = self.assigned_carrier.take();
        self.blocked_remaining_days = self.blocked_remaining_days.max(duration_days.max(1));
        disrupted
    }

    /// Apply a temporary congestion effect, replacing (and reverting) any
    /// existing one.
    pub fn apply_temp_congestion(&mut self, delta: f64, duration_days: u32) {
        if let Some(old) = self.temp_congestion.take() {
            self.congestion = (self.congestion - old.delta).clamp(0.0, 1.0);
        }
        self.congestion = (self.congestion + delta).clamp(0.0, 1.0);
        self.temp_congestion = Some(TempEffect {
            delta,
            remaining_days: duration_days.max(1),
        });
    }

    /// Apply a temporary risk-step effect, replacing (and reverting) any
    /// existing one. `steps` is a signed ordinal delta.
    pub fn apply_temp_risk(&mut self, steps: i32, duration_days: u32) {
        if let Some(old) = self.temp_risk.take() {
            self.risk = self.risk.step(-(old.delta as i32));
        }
        self.risk = self.risk.step(steps);
        self.temp_risk = Some(TempEffect {
            delta: steps as f64,
            remaining_days: duration_days.max(1),
        });
    }

    /// Set congestion directly (event effect application/reversal).
    pub fn set_congestion(&mut self, value: f64) {
        self.congestion = value.clamp(0.0, 1.0);
    }

    /// Set risk directly (event effect application/reversal).
    pub fn set_risk(&mut self, risk: RiskLevel) {
        self.risk = risk;
    }

    /// Lift an event-driven block immediately (early event resolution).
    pub fn unblock(&mut self) {
        self.blocked_remaining_days = 0;
    }

    /// Apply a one-shot upgrade. Duplicates are rejected.
    ///
    /// Returns the upgrade cost (charged by the caller).
    pub fn apply_upgrade(&mut self, upgrade: LaneUpgrade) -> Result<i64, LaneError> {
        if self.upgrades.contains_key(&upgrade) {
            return Err(LaneError::DuplicateUpgrade(upgrade));
        }

        let effect = match upgrade {
            LaneUpgrade::Reinforcement | LaneUpgrade::SecurityPatrol => {
                self.risk = self.risk.step(-1);
                -1.0
            }
            LaneUpgrade::TrafficControl => {
                self.congestion = (self.congestion - 0.2).clamp(0.0, 1.0);
                -0.2
            }
        };
        self.upgrades.insert(upgrade, effect);

        Ok((self.base_cost as f64 * upgrade.cost_factor()).round() as i64)
    }

    // ========================================================================
    // Daily decay and drift
    // ========================================================================

    /// Decrement day-granular timers, reverting expired effects.
    ///
    /// Returns true if anything changed (block lifted or effect expired).
    pub fn decay_daily_effects(&mut self) -> bool {
        let mut changed = false;

        if self.blocked_remaining_days > 0 {
            self.blocked_remaining_days -= 1;
            if self.blocked_remaining_days == 0 {
                changed = true;
            }
        }

        if let Some(effect) = &mut self.temp_congestion {
            effect.remaining_days -= 1;
            if effect.remaining_days == 0 {
                self.congestion = (self.congestion - effect.delta).clamp(0.0, 1.0);
                self.temp_congestion = None;
                changed = true;
            }
        }

        if let Some(effect) = &mut self.temp_risk {
            effect.remaining_days -= 1;
            if effect.remaining_days == 0 {
                self.risk = self.risk.step(-(effect.delta as i32));
                self.temp_risk = None;
                changed = true;
            }
        }

        changed
    }

    /// Daily bounded condition drift: congestion ±0.1, 5% chance of a ±1
    /// risk step. Blocked lanes are excluded by the caller.
    pub fn daily_condition_drift(&mut self, rng: &mut crate::rng::RngManager) -> bool {
        let before_congestion = self.congestion;
        let before_risk = self.risk;

        self.congestion = (self.congestion + rng.uniform(-0.1, 0.1)).clamp(0.0, 1.0);

        if rng.chance(0.05) {
            let step = if rng.chance(0.5) { 1 } else { -1 };
            self.risk = self.risk.step(step);
        }

        self.congestion != before_congestion || self.risk != before_risk
    }

}
