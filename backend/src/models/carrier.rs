//! Carrier model
//!
//! Carriers run deliveries on player lanes. Their reliability and failure
//! chance are derived from accumulated delivery history and recomputed after
//! every status update — they are not static attributes. Each carrier has a
//! fixed negotiation style assigned at creation by a weighted random draw.

use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use thiserror::Error;

/// Number of recent deliveries kept in the ring buffer.
pub const RECENT_DELIVERY_WINDOW: usize = 10;

/// Reliability assumed for carriers without any delivery history.
const PRIOR_RELIABILITY: f64 = 0.7;

/// Fixed behavioral policy governing counter-offer responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NegotiationStyle {
    /// High threshold, never counters
    Firm,
    /// Low threshold, counters at the midpoint
    Flexible,
    /// Very high threshold, counters above the original price
    Aggressive,
    /// Moderate threshold, counters just below the original price
    Fair,
}

impl NegotiationStyle {
    /// Acceptance threshold as a fraction of the original price.
    pub fn acceptance_threshold(self) -> f64 {
        match self {
            NegotiationStyle::Firm => 0.95,
            NegotiationStyle::Flexible => 0.80,
            NegotiationStyle::Aggressive => 0.98,
            NegotiationStyle::Fair => 0.85,
        }
    }

    /// Draw a style with the creation weights
    /// firm/flexible/aggressive/fair = 0.25/0.25/0.2/0.3.
    pub fn draw(rng: &mut RngManager) -> Self {
        const STYLES: [NegotiationStyle; 4] = [
            NegotiationStyle::Firm,
            NegotiationStyle::Flexible,
            NegotiationStyle::Aggressive,
            NegotiationStyle::Fair,
        ];
        const WEIGHTS: [f64; 4] = [0.25, 0.25, 0.2, 0.3];

        // weighted_index only returns None for an empty slice
        let idx = rng.weighted_index(&WEIGHTS).unwrap_or(3);
        STYLES[idx]
    }
}

/// Outcome record for one resolved delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub contract_id: String,
    pub success: bool,
    pub on_time: bool,
    /// Delivery quality, 0..1 (0 for failures)
    pub quality: f64,
}

/// Accumulated delivery history for a carrier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarrierHistory {
    pub completed: u32,
    pub failed: u32,
    pub on_time: u32,
    pub late: u32,
    /// Rolling average quality over all successful deliveries
    pub average_quality: f64,
    /// Last N resolved deliveries, newest at the back
    pub recent: VecDeque<DeliveryRecord>,
}

impl CarrierHistory {
    pub fn total_deliveries(&self) -> u32 {
        self.completed + self.failed
    }

    pub fn success_rate(&self) -> Option<f64> {
        let total = self.total_deliveries();
        if total == 0 {
            return None;
        }
        Some(self.completed as f64 / total as f64)
    }

    pub fn on_time_rate(&self) -> Option<f64> {
        let total = self.on_time + self.late;
        if total == 0 {
            return None;
        }
        Some(self.on_time as f64 / total as f64)
    }

    /// Record one resolved delivery, updating counters, the incremental
    /// quality average, and the ring buffer.
    pub fn record(&mut self, record: DeliveryRecord) {
        if record.success {
            self.completed += 1;
            if record.on_time {
                self.on_time += 1;
            } else {
                self.late += 1;
            }
            // Incremental mean over successful deliveries only
            let n = self.completed as f64;
            self.average_quality += (record.quality - self.average_quality) / n;
        } else {
            self.failed += 1;
        }

        self.recent.push_back(record);
        while self.recent.len() > RECENT_DELIVERY_WINDOW {
            self.recent.pop_front();
        }
    }
}

/// Carrier operation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CarrierError {
    #[error("Carrier is blacklisted")]
    Blacklisted,

    #[error("Carrier is busy until {0}")]
    Busy(f64),

    #[error("Carrier is at its fleet capacity")]
    AtFleetCap,
}

/// A freight carrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carrier {
    id: String,
    name: String,
    /// Reputation score, 0..100
    reputation: f64,
    /// Concurrent-job cap
    fleet_size: u32,
    /// Speed multiplier applied to lane base time
    speed_factor: f64,
    /// Game time until which this carrier cannot take new jobs
    busy_until: f64,
    blacklisted: bool,
    /// Cargo types this carrier specializes in
    preferred_cargo: HashSet<String>,
    /// Willingness to run risky lanes, 0..1
    risk_tolerance: f64,
    /// Multiplier on the base offer price
    pricing_factor: f64,
    style: NegotiationStyle,
    active_contracts: Vec<String>,
    history: CarrierHistory,
}

impl Carrier {
    /// Create a carrier. The negotiation style is drawn from the shared RNG
    /// at creation and fixed for the carrier's lifetime.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        reputation: f64,
        fleet_size: u32,
        speed_factor: f64,
        risk_tolerance: f64,
        pricing_factor: f64,
        preferred_cargo: HashSet<String>,
        rng: &mut RngManager,
    ) -> Self {
        assert!(fleet_size > 0, "fleet_size must be positive");
        Self {
            id: id.into(),
            name: name.into(),
            reputation: reputation.clamp(0.0, 100.0),
            fleet_size,
            speed_factor: speed_factor.max(0.1),
            busy_until: 0.0,
            blacklisted: false,
            preferred_cargo,
            risk_tolerance: risk_tolerance.clamp(0.0, 1.0),
            pricing_factor: pricing_factor.max(0.1),
            style: NegotiationStyle::draw(rng),
            active_contracts: Vec::new(),
            history: CarrierHistory::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reputation(&self) -> f64 {
        self.reputation
    }

    pub fn fleet_size(&self) -> u32 {
        self.fleet_size
    }

    pub fn speed_factor(&self) -> f64 {
        self.speed_factor
    }

    pub fn busy_until(&self) -> f64 {
        self.busy_until
    }

    pub fn is_blacklisted(&self) -> bool {
        self.blacklisted
    }

    /// Trusted status is derived: reputation ≥ 80.
    pub fn is_trusted(&self) -> bool {
        self.reputation >= 80.0
    }

    pub fn preferred_cargo(&self) -> &HashSet<String> {
        &self.preferred_cargo
    }

    pub fn prefers(&self, cargo_type: &str) -> bool {
        self.preferred_cargo.contains(cargo_type)
    }

    pub fn risk_tolerance(&self) -> f64 {
        self.risk_tolerance
    }

    pub fn pricing_factor(&self) -> f64 {
        self.pricing_factor
    }

    pub fn style(&self) -> NegotiationStyle {
        self.style
    }

    pub fn active_contracts(&self) -> &[String] {
        &self.active_contracts
    }

    pub fn history(&self) -> &CarrierHistory {
        &self.history
    }

    /// Reliability: 0.6 × success rate + 0.4 × on-time rate once history
    /// exists; a fixed prior before the first resolved delivery.
    pub fn reliability(&self) -> f64 {
        match (self.history.success_rate(), self.history.on_time_rate()) {
            (Some(sr), Some(otr)) => 0.6 * sr + 0.4 * otr,
            (Some(sr), None) => 0.6 * sr + 0.4 * PRIOR_RELIABILITY,
            _ => PRIOR_RELIABILITY,
        }
    }

    /// Failure chance derived from reliability: max(0.01, 0.3 − r × 0.25).
    pub fn failure_chance(&self) -> f64 {
        (0.3 - self.reliability() * 0.25).max(0.01)
    }

    /// Availability filter used by offer generation.
    pub fn check_available(&self, now: f64) -> Result<(), CarrierError> {
        if self.blacklisted {
            return Err(CarrierError::Blacklisted);
        }
        if self.busy_until > now {
            return Err(CarrierError::Busy(self.busy_until));
        }
        if self.active_contracts.len() >= self.fleet_size as usize {
            return Err(CarrierError::AtFleetCap);
        }
        Ok(())
    }

    pub fn is_available(&self, now: f64) -> bool {
        self.check_available(now).is_ok()
    }

    pub fn set_blacklisted(&mut self, blacklisted: bool) {
        self.blacklisted = blacklisted;
    }

    pub fn mark_busy_until(&mut self, time: f64) {
        self.busy_until = self.busy_until.max(time);
    }

    pub fn clear_busy(&mut self) {
        self.busy_until = 0.0;
    }

    /// Set reputation to an exact value (event effect reversal).
    pub fn set_reputation(&mut self, value: f64) {
        self.reputation = value.clamp(0.0, 100.0);
    }

    /// Adjust reputation by `delta`, clamped to [0, 100].
    pub fn adjust_reputation(&mut self, delta: f64) -> f64 {
        self.reputation = (self.reputation + delta).clamp(0.0, 100.0);
        self.reputation
    }

    pub fn add_active_contract(&mut self, contract_id: impl Into<String>) {
        self.active_contracts.push(contract_id.into());
    }

    pub fn remove_active_contract(&mut self, contract_id: &str) {
        self.active_contracts.retain(|id| id != contract_id);
    }

    /// Record a resolved delivery. Reliability and failure chance are
    /// derived values, so they reflect the new history immediately.
    pub fn record_delivery(&mut self, record: DeliveryRecord) {
        self.history.record(record);
    }
}
