//! World event engine
//!
//! Spawns random world events on a randomized interval, applies their
//! effects to the other engines immediately (recording original-value
//! snapshots), and resolves them either through a player response or
//! through the per-tick expiration sweep. Positive outcomes revert every
//! recorded effect exactly once; negative terminal outcomes leave the
//! world changed.
//!
//! Cross-engine effects are applied through explicit `&mut` references
//! passed per call — the engine holds no references of its own, so every
//! interaction resolves synchronously inside the caller's tick.

use crate::carriers::CarrierEngine;
use crate::contracts::ContractEngine;
use crate::core::time::SECONDS_PER_DAY;
use crate::map::MapState;
use crate::market::{MarketEngine, ModifierKind, ModifierStacking, ModifierTarget, PriceModifier};
use crate::models::notification::{Notification, NotificationLog};
use crate::models::world_event::{
    AppliedEffect, EventKind, EventOutcome, WorldEvent, WorldEventError,
};
use crate::models::EntityRef;
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bounds of the randomized spawn interval, in simulated seconds.
pub const EVENT_INTERVAL: (f64, f64) = (60.0, 300.0);

/// Spawn weights per kind, in [`EventKind::ALL`] order.
pub const DEFAULT_KIND_WEIGHTS: [f64; 6] = [0.25, 0.20, 0.15, 0.10, 0.15, 0.15];

/// Base event duration per kind, in simulated seconds; actual duration is
/// the base ±30%.
fn base_duration(kind: EventKind) -> f64 {
    match kind {
        EventKind::Economic => 300.0,
        EventKind::Weather => 180.0,
        EventKind::Carrier => 240.0,
        EventKind::Regulatory => 360.0,
        EventKind::Customer => 180.0,
        EventKind::Criminal => 240.0,
    }
}

/// The world event engine.
#[derive(Debug, Clone)]
pub struct EventEngine {
    events: BTreeMap<String, WorldEvent>,
    next_event_id: u64,
    /// 0.0 = not yet scheduled
    next_event_at: f64,
    kind_weights: [f64; 6],
}

impl Default for EventEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EventEngine {
    pub fn new() -> Self {
        Self {
            events: BTreeMap::new(),
            next_event_id: 1,
            next_event_at: 0.0,
            kind_weights: DEFAULT_KIND_WEIGHTS,
        }
    }

    pub fn event(&self, id: &str) -> Option<&WorldEvent> {
        self.events.get(id)
    }

    pub fn events(&self) -> impl Iterator<Item = &WorldEvent> {
        self.events.values()
    }

    pub fn active_events(&self) -> impl Iterator<Item = &WorldEvent> {
        self.events.values().filter(|e| e.is_active())
    }

    // ========================================================================
    // Spawning
    // ========================================================================

    /// Scheduler entry, run every tick. Spawns at most one event when the
    /// randomized interval has lapsed, then recomputes the interval.
    #[allow(clippy::too_many_arguments)]
    pub fn process_tick(
        &mut self,
        now: f64,
        rng: &mut RngManager,
        market: &mut MarketEngine,
        map: &mut MapState,
        carriers: &mut CarrierEngine,
        contracts: &mut ContractEngine,
        log: &mut NotificationLog,
    ) {
        if self.next_event_at == 0.0 {
            self.next_event_at = now + rng.uniform(EVENT_INTERVAL.0, EVENT_INTERVAL.1);
            return;
        }
        if now < self.next_event_at {
            return;
        }

        self.spawn_random_event(now, rng, market, map, carriers, contracts, log);
        self.next_event_at = now + rng.uniform(EVENT_INTERVAL.0, EVENT_INTERVAL.1);
    }

    /// Spawn one event with a weighted-random kind and U[0.2, 1.0] severity.
    /// Returns None when no valid target exists for the drawn kind.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn_random_event(
        &mut self,
        now: f64,
        rng: &mut RngManager,
        market: &mut MarketEngine,
        map: &mut MapState,
        carriers: &mut CarrierEngine,
        contracts: &mut ContractEngine,
        log: &mut NotificationLog,
    ) -> Option<String> {
        let kind = EventKind::ALL[rng.weighted_index(&self.kind_weights).expect("six weights")];
        let severity = rng.uniform(0.2, 1.0);
        self.spawn_event(kind, severity, now, rng, market, map, carriers, contracts, log)
    }

    /// Spawn an event of a specific kind and severity. Effects are applied
    /// immediately, with original values recorded for reversal.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn_event(
        &mut self,
        kind: EventKind,
        severity: f64,
        now: f64,
        rng: &mut RngManager,
        market: &mut MarketEngine,
        map: &mut MapState,
        carriers: &mut CarrierEngine,
        contracts: &mut ContractEngine,
        log: &mut NotificationLog,
    ) -> Option<String> {
        let duration = base_duration(kind) * (1.0 + rng.uniform(-0.3, 0.3));
        let event_id = format!("event_{:06}", self.next_event_id);

        let mut event = WorldEvent::new(&event_id, kind, "", now, now + duration, severity);

        let name = match kind {
            EventKind::Economic => self.apply_economic(&mut event, rng, market)?,
            EventKind::Weather => self.apply_weather(&mut event, rng, map, carriers, now, log)?,
            EventKind::Carrier => self.apply_carrier(&mut event, rng, carriers)?,
            EventKind::Regulatory => self.apply_regulatory(&mut event, rng, market)?,
            EventKind::Customer => self.apply_customer(&mut event, rng, contracts)?,
            EventKind::Criminal => self.apply_criminal(&mut event, rng, map)?,
        };

        event.set_name(name.clone());
        self.next_event_id += 1;
        self.events.insert(event_id.clone(), event);

        log.push(Notification::EventTriggered {
            time: now,
            event_id: event_id.clone(),
            kind,
            name,
            severity,
        });

        Some(event_id)
    }

    // ------------------------------------------------------------------------
    // Per-kind effect application
    // ------------------------------------------------------------------------

    fn apply_economic(
        &self,
        event: &mut WorldEvent,
        rng: &mut RngManager,
        market: &mut MarketEngine,
    ) -> Option<String> {
        let ids: Vec<String> = market.commodity_ids().map(|s| s.to_string()).collect();
        if ids.is_empty() {
            return None;
        }
        let commodity = ids[rng.range(0, ids.len() as i64) as usize].clone();

        let surge = rng.chance(0.5);
        let magnitude = if surge {
            1.0 + event.severity() * 0.5
        } else {
            1.0 / (1.0 + event.severity() * 0.5)
        };

        let modifier_id = format!("event:{}", event.id());
        market.add_modifier(PriceModifier::new(
            modifier_id.clone(),
            ModifierTarget::Commodity(commodity.clone()),
            magnitude,
            ModifierKind::Multiplicative,
            ModifierStacking::Base,
        ));

        event.add_target(EntityRef::Commodity(commodity.clone()));
        event.record_effect(AppliedEffect::AddedPriceModifier {
            target: EntityRef::Commodity(commodity.clone()),
            modifier_id,
        });

        let direction = if surge { "shortage" } else { "glut" };
        Some(format!("Market {direction}: {commodity}"))
    }

    fn apply_weather(
        &self,
        event: &mut WorldEvent,
        rng: &mut RngManager,
        map: &mut MapState,
        carriers: &mut CarrierEngine,
        now: f64,
        log: &mut NotificationLog,
    ) -> Option<String> {
        let regions: Vec<String> = map.region_ids().map(|s| s.to_string()).collect();
        if regions.is_empty() {
            return None;
        }
        let region_id = regions[rng.range(0, regions.len() as i64) as usize].clone();
        let lane_ids = map.lanes_in_region(&region_id);
        let severity = event.severity();

        for lane_id in &lane_ids {
            let lane = map.lane_mut(lane_id).expect("lane id from region scan");

            let original_congestion = lane.congestion();
            lane.set_congestion(original_congestion + severity * 0.4);
            event.record_effect(AppliedEffect::SetLaneCongestion {
                target: EntityRef::Lane(lane_id.clone()),
                original: original_congestion,
            });

            let original_risk = lane.risk();
            lane.set_risk(original_risk.step(1));
            event.record_effect(AppliedEffect::SetLaneRisk {
                target: EntityRef::Lane(lane_id.clone()),
                original: original_risk,
            });

            event.add_target(EntityRef::Lane(lane_id.clone()));
        }

        // Severe storms close the region's lanes outright
        if severity > 0.7 {
            let duration_days = ((event.end_time() - event.start_time()) / SECONDS_PER_DAY)
                .ceil()
                .max(1.0) as u32;
            let disrupted = map.block_lanes(std::slice::from_ref(&region_id), duration_days);

            for lane_id in &lane_ids {
                event.record_effect(AppliedEffect::BlockedLane {
                    target: EntityRef::Lane(lane_id.clone()),
                });
                log.push(Notification::LaneStatusChanged {
                    time: now,
                    lane_id: lane_id.clone(),
                    status: map.lane(lane_id).expect("lane exists").status(),
                });
            }

            for disruption in disrupted {
                carriers.handle_disruption(&disruption.carrier_id, &disruption.lane_id, now, log);
            }
        }

        Some(format!("Storm front over {region_id}"))
    }

    fn apply_carrier(
        &self,
        event: &mut WorldEvent,
        rng: &mut RngManager,
        carriers: &mut CarrierEngine,
    ) -> Option<String> {
        let ids: Vec<String> = carriers
            .carriers()
            .filter(|c| !c.is_blacklisted())
            .map(|c| c.id().to_string())
            .collect();
        if ids.is_empty() {
            return None;
        }
        let carrier_id = ids[rng.range(0, ids.len() as i64) as usize].clone();
        let severity = event.severity();

        let carrier = carriers.carrier_mut(&carrier_id).expect("id from scan");

        let original = carrier.reputation();
        carrier.adjust_reputation(-severity * 10.0);
        event.record_effect(AppliedEffect::AdjustedCarrierReputation {
            target: EntityRef::Carrier(carrier_id.clone()),
            original,
        });

        if severity > 0.8 {
            event.record_effect(AppliedEffect::SetCarrierBlacklist {
                target: EntityRef::Carrier(carrier_id.clone()),
                original: carrier.is_blacklisted(),
            });
            carrier.set_blacklisted(true);
        }

        event.add_target(EntityRef::Carrier(carrier_id.clone()));
        Some(format!("Labor dispute at {carrier_id}"))
    }

    fn apply_regulatory(
        &self,
        event: &mut WorldEvent,
        rng: &mut RngManager,
        market: &mut MarketEngine,
    ) -> Option<String> {
        let ids: Vec<String> = market.commodity_ids().map(|s| s.to_string()).collect();
        if ids.is_empty() {
            return None;
        }
        let commodity = ids[rng.range(0, ids.len() as i64) as usize].clone();

        let modifier_id = format!("event:{}", event.id());
        market.add_modifier(PriceModifier::new(
            modifier_id.clone(),
            ModifierTarget::Commodity(commodity.clone()),
            1.0 + event.severity() * 0.2,
            ModifierKind::Multiplicative,
            ModifierStacking::Total,
        ));

        event.add_target(EntityRef::Commodity(commodity.clone()));
        event.record_effect(AppliedEffect::AddedPriceModifier {
            target: EntityRef::Commodity(commodity.clone()),
            modifier_id,
        });

        Some(format!("Import tariff on {commodity}"))
    }

    fn apply_customer(
        &self,
        event: &mut WorldEvent,
        rng: &mut RngManager,
        contracts: &mut ContractEngine,
    ) -> Option<String> {
        let ids: Vec<String> = contracts.customers().map(|c| c.id().to_string()).collect();
        if ids.is_empty() {
            return None;
        }
        let customer_id = ids[rng.range(0, ids.len() as i64) as usize].clone();
        let severity = event.severity();

        let customer = contracts.customer_mut(&customer_id).expect("id from scan");
        let original = customer.trust();
        customer.adjust_trust(-severity * 10.0);

        event.add_target(EntityRef::Customer(customer_id.clone()));
        event.record_effect(AppliedEffect::AdjustedCustomerTrust {
            target: EntityRef::Customer(customer_id.clone()),
            original,
        });

        Some(format!("Service complaint from {customer_id}"))
    }

    fn apply_criminal(
        &self,
        event: &mut WorldEvent,
        rng: &mut RngManager,
        map: &mut MapState,
    ) -> Option<String> {
        let ids: Vec<String> = map.lane_ids().map(|s| s.to_string()).collect();
        if ids.is_empty() {
            return None;
        }
        let lane_id = ids[rng.range(0, ids.len() as i64) as usize].clone();

        let lane = map.lane_mut(&lane_id).expect("id from scan");
        let original = lane.risk();
        lane.set_risk(original.step(2));

        event.add_target(EntityRef::Lane(lane_id.clone()));
        event.record_effect(AppliedEffect::SetLaneRisk {
            target: EntityRef::Lane(lane_id.clone()),
            original,
        });

        Some(format!("Cargo theft ring on {lane_id}"))
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Resolve an event with a player response.
    ///
    /// Unknown responses leave the event active and return
    /// [`EventOutcome::Ongoing`] without consuming the one-shot response
    /// slot. Terminal outcomes deactivate the event; positive ones revert
    /// its effects.
    #[allow(clippy::too_many_arguments)]
    pub fn resolve_event(
        &mut self,
        event_id: &str,
        response: &str,
        now: f64,
        market: &mut MarketEngine,
        map: &mut MapState,
        carriers: &mut CarrierEngine,
        contracts: &mut ContractEngine,
        log: &mut NotificationLog,
    ) -> Result<EventOutcome, WorldEventError> {
        let event = self
            .events
            .get_mut(event_id)
            .ok_or_else(|| WorldEventError::NotFound(event_id.to_string()))?;

        if !event.is_active() {
            return Err(WorldEventError::AlreadyResolved);
        }

        let Some(outcome) = event.kind().outcome_for_response(response) else {
            return Ok(EventOutcome::Ongoing);
        };

        event.set_response(response)?;
        let first = event.finalize(outcome);
        debug_assert!(first, "active event must finalize exactly once");

        if outcome.triggers_cleanup() {
            self.cleanup_event(event_id, market, map, carriers, contracts, log);
        }

        log.push(Notification::EventResolved {
            time: now,
            event_id: event_id.to_string(),
            outcome,
        });

        Ok(outcome)
    }

    /// Expiration sweep, run every tick: active events past their end time
    /// get their kind's default outcome, exactly once.
    #[allow(clippy::too_many_arguments)]
    pub fn sweep_expired(
        &mut self,
        now: f64,
        market: &mut MarketEngine,
        map: &mut MapState,
        carriers: &mut CarrierEngine,
        contracts: &mut ContractEngine,
        log: &mut NotificationLog,
    ) -> Vec<String> {
        let expired_ids: Vec<String> = self
            .events
            .values()
            .filter(|e| e.is_active() && e.is_expired(now))
            .map(|e| e.id().to_string())
            .collect();

        for event_id in &expired_ids {
            let event = self.events.get_mut(event_id).expect("id from scan");
            let outcome = event.kind().default_outcome();

            if !event.finalize(outcome) {
                continue;
            }

            if outcome.triggers_cleanup() {
                self.cleanup_event(event_id, market, map, carriers, contracts, log);
            }

            log.push(Notification::EventExpired {
                time: now,
                event_id: event_id.clone(),
                outcome,
            });
        }

        expired_ids
    }

    /// Revert every recorded effect of an event from its original-value
    /// snapshots. Idempotent: the second call is a no-op and returns false.
    pub fn cleanup_event(
        &mut self,
        event_id: &str,
        market: &mut MarketEngine,
        map: &mut MapState,
        carriers: &mut CarrierEngine,
        contracts: &mut ContractEngine,
        log: &mut NotificationLog,
    ) -> bool {
        let Some(event) = self.events.get_mut(event_id) else {
            return false;
        };
        if !event.mark_effects_reverted() {
            return false;
        }
        let effects = event.effects().to_vec();
        let end_time = event.end_time();

        for effect in effects {
            match effect {
                AppliedEffect::AddedPriceModifier { modifier_id, .. } => {
                    market.remove_modifier(&modifier_id);
                }
                AppliedEffect::SetLaneCongestion { target, original } => {
                    if let Some(lane) = map.lane_mut(target.id()) {
                        lane.set_congestion(original);
                    }
                }
                AppliedEffect::SetLaneRisk { target, original } => {
                    if let Some(lane) = map.lane_mut(target.id()) {
                        lane.set_risk(original);
                    }
                }
                AppliedEffect::BlockedLane { target } => {
                    if let Some(lane) = map.lane_mut(target.id()) {
                        lane.unblock();
                        log.push(Notification::LaneStatusChanged {
                            time: end_time,
                            lane_id: target.id().to_string(),
                            status: lane.status(),
                        });
                    }
                }
                AppliedEffect::SetCarrierBlacklist { target, original } => {
                    if let Some(carrier) = carriers.carrier_mut(target.id()) {
                        carrier.set_blacklisted(original);
                    }
                }
                AppliedEffect::AdjustedCarrierReputation { target, original } => {
                    if let Some(carrier) = carriers.carrier_mut(target.id()) {
                        carrier.set_reputation(original);
                    }
                }
                AppliedEffect::AdjustedCustomerTrust { target, original } => {
                    if let Some(customer) = contracts.customer_mut(target.id()) {
                        customer.set_trust(original);
                    }
                }
            }
        }

        true
    }

    // ========================================================================
    // Snapshot
    // ========================================================================

    pub fn to_snapshot(&self) -> EventEngineSnapshot {
        EventEngineSnapshot {
            events: self.events.values().cloned().collect(),
            next_event_id: self.next_event_id,
            next_event_at: self.next_event_at,
            kind_weights: self.kind_weights,
        }
    }

    pub fn from_snapshot(snapshot: EventEngineSnapshot) -> Self {
        let mut engine = Self::new();
        for event in snapshot.events {
            engine.events.insert(event.id().to_string(), event);
        }
        engine.next_event_id = snapshot.next_event_id;
        engine.next_event_at = snapshot.next_event_at;
        engine.kind_weights = snapshot.kind_weights;
        engine
    }
}

/// Serialized event engine state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEngineSnapshot {
    pub events: Vec<WorldEvent>,
    pub next_event_id: u64,
    pub next_event_at: f64,
    pub kind_weights: [f64; 6],
}
