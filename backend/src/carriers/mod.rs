//! Carrier engine
//!
//! Maintains the carrier roster, produces job offers for a lane/cargo
//! combination, runs the stateful counter-offer negotiation protocol, and
//! resolves deliveries on a periodic cadence. Carrier reliability and
//! failure chance are derived from history, so every resolved delivery
//! immediately shifts future odds.
//!
//! Credential vetting uses a generator scoped to the carrier id
//! ([`RngManager::scoped`]) so the shared random stream is never perturbed
//! by roster changes.

use crate::market::MarketEngine;
use crate::models::carrier::{Carrier, CarrierError, DeliveryRecord};
use crate::models::contract::{
    CarrierContract, CarrierContractStatus, CarrierOffer, ContractError,
};
use crate::models::lane::Lane;
use crate::models::notification::{Notification, NotificationLog};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Seconds between delivery-resolution passes.
pub const CARRIER_UPDATE_INTERVAL: f64 = 5.0;

/// Probability that a non-specialist carrier enters the offer pool.
pub const CARRIER_OFFER_PROBABILITY: f64 = 0.3;

/// Seconds a quote stays valid.
pub const OFFER_VALIDITY: f64 = 30.0;

/// Price discount for carriers specializing in the cargo.
const PREFERENCE_DISCOUNT: f64 = 0.9;

/// Probability a carrier's credentials turn out fake at vetting.
const FAKE_CREDENTIAL_RATE: f64 = 0.05;

/// Reputation lost on a failed delivery.
const FAILURE_REPUTATION_PENALTY: f64 = -5.0;

/// Carrier engine errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CarrierEngineError {
    #[error("Unknown carrier: {0}")]
    UnknownCarrier(String),

    #[error("Unknown carrier contract: {0}")]
    UnknownContract(String),

    #[error("No eligible carriers for this job")]
    NoEligibleCarriers,

    #[error("Cargo type {0} is restricted on this lane")]
    CargoRestricted(String),

    #[error("Offer expired at {0}")]
    OfferExpired(f64),

    #[error(transparent)]
    Carrier(#[from] CarrierError),

    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// Carrier reply to a counter-offer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NegotiationResponse {
    /// Counter accepted at the counter price
    Accepted { price: i64 },
    /// Carrier counters with a new price
    Counter { price: i64 },
    /// Carrier walks away
    Rejected,
}

/// One resolved delivery, reported to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryResolution {
    pub contract_id: String,
    pub carrier_id: String,
    pub lane_id: String,
    pub success: bool,
    pub on_time: bool,
    pub quality: f64,
}

/// The carrier roster and job book.
#[derive(Debug, Clone)]
pub struct CarrierEngine {
    carriers: BTreeMap<String, Carrier>,
    contracts: BTreeMap<String, CarrierContract>,
    next_contract_id: u64,
    next_update_at: f64,
    /// Base seed for entity-scoped vetting draws
    base_seed: u64,
}

impl CarrierEngine {
    pub fn new(base_seed: u64) -> Self {
        Self {
            carriers: BTreeMap::new(),
            contracts: BTreeMap::new(),
            next_contract_id: 1,
            next_update_at: 0.0,
            base_seed,
        }
    }

    // ========================================================================
    // Roster
    // ========================================================================

    /// Add a carrier to the roster, vetting its credentials first.
    ///
    /// Vetting draws from a generator scoped to the carrier id, so it is
    /// stable per carrier and leaves the shared stream untouched. Carriers
    /// that fail vetting join the roster blacklisted.
    pub fn add_carrier(&mut self, mut carrier: Carrier) {
        if !self.vet_credentials(carrier.id()) {
            carrier.set_blacklisted(true);
        }
        self.carriers.insert(carrier.id().to_string(), carrier);
    }

    /// Deterministic per-carrier credential check.
    pub fn vet_credentials(&self, carrier_id: &str) -> bool {
        let mut scoped = RngManager::scoped(self.base_seed, carrier_id);
        !scoped.chance(FAKE_CREDENTIAL_RATE)
    }

    pub fn carrier(&self, id: &str) -> Option<&Carrier> {
        self.carriers.get(id)
    }

    pub fn carrier_mut(&mut self, id: &str) -> Option<&mut Carrier> {
        self.carriers.get_mut(id)
    }

    pub fn carriers(&self) -> impl Iterator<Item = &Carrier> {
        self.carriers.values()
    }

    pub fn contract(&self, id: &str) -> Option<&CarrierContract> {
        self.contracts.get(id)
    }

    pub fn contracts(&self) -> impl Iterator<Item = &CarrierContract> {
        self.contracts.values()
    }

    pub fn active_contracts(&self) -> impl Iterator<Item = &CarrierContract> {
        self.contracts.values().filter(|c| c.is_active())
    }

    // ========================================================================
    // Offers
    // ========================================================================

    /// Generate a quote for moving `amount` of `cargo_type` over `lane`.
    ///
    /// Eligibility: not blacklisted, not busy, under the fleet cap. Cargo
    /// specialists always enter the pool; everyone else joins with
    /// probability [`CARRIER_OFFER_PROBABILITY`]. One carrier is then drawn
    /// uniformly.
    #[allow(clippy::too_many_arguments)]
    pub fn generate_offer(
        &mut self,
        lane: &Lane,
        cargo_type: &str,
        amount: u32,
        deadline: f64,
        market: &MarketEngine,
        now: f64,
        rng: &mut RngManager,
        log: &mut NotificationLog,
    ) -> Result<CarrierOffer, CarrierEngineError> {
        if !lane.is_cargo_allowed(cargo_type) {
            return Err(CarrierEngineError::CargoRestricted(cargo_type.to_string()));
        }

        // BTreeMap order keeps the Bernoulli draws reproducible
        let mut eligible: Vec<String> = Vec::new();
        for carrier in self.carriers.values() {
            if !carrier.is_available(now) {
                continue;
            }
            if carrier.prefers(cargo_type) || rng.chance(CARRIER_OFFER_PROBABILITY) {
                eligible.push(carrier.id().to_string());
            }
        }

        if eligible.is_empty() {
            return Err(CarrierEngineError::NoEligibleCarriers);
        }

        let carrier_id = eligible[rng.range(0, eligible.len() as i64) as usize].clone();
        let carrier = &self.carriers[&carrier_id];

        let price = Self::quote_price(carrier, lane, cargo_type, amount, market, now);
        let estimated_time = lane.delivery_time(carrier.speed_factor());

        let offer = CarrierOffer {
            carrier_id: carrier_id.clone(),
            lane_id: lane.id().to_string(),
            cargo_type: cargo_type.to_string(),
            amount,
            price,
            estimated_time,
            deadline,
            expires_at: now + OFFER_VALIDITY,
        };

        log.push(Notification::CarrierOfferMade {
            time: now,
            carrier_id,
            lane_id: lane.id().to_string(),
            price,
        });

        Ok(offer)
    }

    /// Quoted price: commodity value of the load × lane cost factor ×
    /// carrier pricing factor, discounted for cargo specialists, with a
    /// risk premium damped by the carrier's risk tolerance.
    fn quote_price(
        carrier: &Carrier,
        lane: &Lane,
        cargo_type: &str,
        amount: u32,
        market: &MarketEngine,
        now: f64,
    ) -> i64 {
        let commodity_price = market.get_price(cargo_type, now, None);
        let lane_cost_factor = lane.base_cost() as f64 / 100_000.0;

        let mut price = commodity_price * amount as f64 * lane_cost_factor * carrier.pricing_factor();

        if carrier.prefers(cargo_type) {
            price *= PREFERENCE_DISCOUNT;
        }

        let risk_premium =
            1.0 + lane.risk().as_index() as f64 * 0.1 * (1.0 - carrier.risk_tolerance());
        price *= risk_premium;

        price.round() as i64
    }

    /// Accept an offer, creating an active carrier contract and marking the
    /// carrier busy until the expected completion.
    pub fn accept_offer(
        &mut self,
        offer: &CarrierOffer,
        now: f64,
        log: &mut NotificationLog,
    ) -> Result<String, CarrierEngineError> {
        if offer.is_expired(now) {
            return Err(CarrierEngineError::OfferExpired(offer.expires_at));
        }

        let carrier = self
            .carriers
            .get_mut(&offer.carrier_id)
            .ok_or_else(|| CarrierEngineError::UnknownCarrier(offer.carrier_id.clone()))?;
        carrier.check_available(now)?;

        let contract_id = format!("job_{:06}", self.next_contract_id);
        self.next_contract_id += 1;

        let expected_completion = now + offer.estimated_time;
        let contract = CarrierContract::new(
            contract_id.clone(),
            offer.carrier_id.clone(),
            offer.lane_id.clone(),
            offer.cargo_type.clone(),
            offer.amount,
            offer.price,
            now,
            expected_completion,
            offer.deadline,
        );

        carrier.mark_busy_until(expected_completion);
        carrier.add_active_contract(&contract_id);
        self.contracts.insert(contract_id.clone(), contract);

        log.push(Notification::CarrierJobAccepted {
            time: now,
            contract_id: contract_id.clone(),
            carrier_id: offer.carrier_id.clone(),
        });

        Ok(contract_id)
    }

    // ========================================================================
    // Negotiation
    // ========================================================================

    /// Run one round of the counter-offer protocol.
    ///
    /// The carrier accepts when the counter reaches its style threshold
    /// (reduced by up to 0.10 for a high player reputation); otherwise it
    /// replies per style: firm walks away, flexible counters the midpoint,
    /// aggressive counters 5% above the original, fair counters 95% of the
    /// original but at least 10% over the player's counter.
    pub fn negotiate_offer(
        &self,
        offer: &CarrierOffer,
        counter_price: i64,
        player_reputation: f64,
        now: f64,
    ) -> Result<NegotiationResponse, CarrierEngineError> {
        if offer.is_expired(now) {
            return Err(CarrierEngineError::OfferExpired(offer.expires_at));
        }

        let carrier = self
            .carriers
            .get(&offer.carrier_id)
            .ok_or_else(|| CarrierEngineError::UnknownCarrier(offer.carrier_id.clone()))?;

        let reputation_discount = (player_reputation / 100.0).clamp(0.0, 1.0) * 0.10;
        let threshold = carrier.style().acceptance_threshold() - reputation_discount;
        let floor = (offer.price as f64 * threshold).round() as i64;

        if counter_price >= floor {
            return Ok(NegotiationResponse::Accepted {
                price: counter_price,
            });
        }

        use crate::models::carrier::NegotiationStyle::*;
        let response = match carrier.style() {
            Firm => NegotiationResponse::Rejected,
            Flexible => NegotiationResponse::Counter {
                price: (offer.price + counter_price) / 2,
            },
            Aggressive => NegotiationResponse::Counter {
                price: (offer.price as f64 * 1.05).round() as i64,
            },
            Fair => NegotiationResponse::Counter {
                price: ((offer.price as f64 * 0.95).round() as i64)
                    .max((counter_price as f64 * 1.10).round() as i64),
            },
        };
        Ok(response)
    }

    // ========================================================================
    // Delivery resolution
    // ========================================================================

    /// Periodic pass resolving contracts whose expected completion has
    /// arrived. Success probability is 1 − failure_chance; quality is
    /// U[0.7, 1.0] × reliability; failures cost the carrier reputation.
    pub fn process_tick(
        &mut self,
        now: f64,
        rng: &mut RngManager,
        log: &mut NotificationLog,
    ) -> Vec<DeliveryResolution> {
        if now < self.next_update_at {
            return Vec::new();
        }
        self.next_update_at = now + CARRIER_UPDATE_INTERVAL;

        let due_ids: Vec<String> = self
            .contracts
            .values()
            .filter(|c| c.is_active() && c.is_due(now))
            .map(|c| c.id().to_string())
            .collect();

        let mut resolutions = Vec::new();

        for contract_id in due_ids {
            let contract = self.contracts.get_mut(&contract_id).expect("id from scan");
            let carrier_id = contract.carrier_id().to_string();
            let lane_id = contract.lane_id().to_string();
            let on_time = contract.is_on_time(now);

            let Some(carrier) = self.carriers.get_mut(&carrier_id) else {
                // Carrier vanished (bad snapshot edit); fail the job quietly
                let _ = contract.fail();
                continue;
            };

            let success = !rng.chance(carrier.failure_chance());
            let quality = if success {
                rng.uniform(0.7, 1.0) * carrier.reliability()
            } else {
                0.0
            };

            if success {
                let _ = contract.complete(quality);
            } else {
                let _ = contract.fail();
                carrier.adjust_reputation(FAILURE_REPUTATION_PENALTY);
            }

            carrier.record_delivery(DeliveryRecord {
                contract_id: contract_id.clone(),
                success,
                on_time,
                quality,
            });
            carrier.remove_active_contract(&contract_id);

            if success {
                log.push(Notification::CarrierJobCompleted {
                    time: now,
                    contract_id: contract_id.clone(),
                    carrier_id: carrier_id.clone(),
                    on_time,
                    quality,
                });
            } else {
                log.push(Notification::CarrierJobFailed {
                    time: now,
                    contract_id: contract_id.clone(),
                    carrier_id: carrier_id.clone(),
                });
            }

            resolutions.push(DeliveryResolution {
                contract_id,
                carrier_id,
                lane_id,
                success,
                on_time,
                quality,
            });
        }

        resolutions
    }

    /// Handle a lane block disrupting this carrier's jobs on that lane:
    /// active contracts there fail without a reputation or history penalty
    /// (the disruption is not carrier performance).
    pub fn handle_disruption(
        &mut self,
        carrier_id: &str,
        lane_id: &str,
        now: f64,
        log: &mut NotificationLog,
    ) {
        let disrupted_ids: Vec<String> = self
            .contracts
            .values()
            .filter(|c| c.is_active() && c.carrier_id() == carrier_id && c.lane_id() == lane_id)
            .map(|c| c.id().to_string())
            .collect();

        for contract_id in &disrupted_ids {
            if let Some(contract) = self.contracts.get_mut(contract_id) {
                let _ = contract.fail();
            }
            if let Some(carrier) = self.carriers.get_mut(carrier_id) {
                carrier.remove_active_contract(contract_id);
                carrier.clear_busy();
            }
        }

        log.push(Notification::CarrierDisrupted {
            time: now,
            carrier_id: carrier_id.to_string(),
            lane_id: lane_id.to_string(),
        });
    }

    /// Daily pass: drop terminal contracts older than 30 days so the job
    /// book stays bounded.
    pub fn process_daily_update(&mut self, now: f64) {
        const RETENTION: f64 = 30.0 * crate::core::time::SECONDS_PER_DAY;
        self.contracts
            .retain(|_, c| c.is_active() || now - c.start_time() < RETENTION);
    }

    // ========================================================================
    // Snapshot
    // ========================================================================

    pub fn to_snapshot(&self) -> CarrierEngineSnapshot {
        CarrierEngineSnapshot {
            carriers: self.carriers.values().cloned().collect(),
            contracts: self
                .contracts
                .values()
                .map(|c| CarrierContractSnapshot {
                    id: c.id().to_string(),
                    carrier_id: c.carrier_id().to_string(),
                    lane_id: c.lane_id().to_string(),
                    cargo_type: c.cargo_type().to_string(),
                    amount: c.amount(),
                    price: c.price(),
                    start_time: c.start_time(),
                    expected_completion: c.expected_completion(),
                    deadline: c.deadline(),
                    status: c.status(),
                    quality: c.quality(),
                })
                .collect(),
            next_contract_id: self.next_contract_id,
            next_update_at: self.next_update_at,
            base_seed: self.base_seed,
        }
    }

    pub fn from_snapshot(snapshot: CarrierEngineSnapshot) -> Self {
        let mut engine = Self::new(snapshot.base_seed);
        for carrier in snapshot.carriers {
            // Blacklist state is part of the snapshot; no re-vetting
            engine.carriers.insert(carrier.id().to_string(), carrier);
        }
        for c in snapshot.contracts {
            engine.contracts.insert(
                c.id.clone(),
                CarrierContract::from_snapshot(
                    c.id,
                    c.carrier_id,
                    c.lane_id,
                    c.cargo_type,
                    c.amount,
                    c.price,
                    c.start_time,
                    c.expected_completion,
                    c.deadline,
                    c.status,
                    c.quality,
                ),
            );
        }
        engine.next_contract_id = snapshot.next_contract_id;
        engine.next_update_at = snapshot.next_update_at;
        engine
    }
}

/// Serialized carrier contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierContractSnapshot {
    pub id: String,
    pub carrier_id: String,
    pub lane_id: String,
    pub cargo_type: String,
    pub amount: u32,
    pub price: i64,
    pub start_time: f64,
    pub expected_completion: f64,
    pub deadline: f64,
    pub status: CarrierContractStatus,
    pub quality: f64,
}

/// Serialized carrier engine state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierEngineSnapshot {
    pub carriers: Vec<Carrier>,
    pub contracts: Vec<CarrierContractSnapshot>,
    pub next_contract_id: u64,
    pub next_update_at: f64,
    pub base_seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lane::RiskLevel;
    use crate::models::Commodity;

    fn steel_market() -> MarketEngine {
        let mut market = MarketEngine::new();
        market.add_commodity(Commodity::new("STEEL", "Steel", "raw_materials", 6000.0));
        market
    }

    fn test_lane() -> Lane {
        Lane::new("lane_ab", "city_a", "city_b", 1000.0, 0.0, RiskLevel::Low)
    }

    fn add_test_carrier(engine: &mut CarrierEngine, id: &str, rng: &mut RngManager) {
        let carrier = Carrier::new(
            id,
            format!("Carrier {id}"),
            60.0,
            2,
            1.0,
            1.0, // full risk tolerance → no risk premium
            1.0,
            ["STEEL".to_string()].into_iter().collect(),
            rng,
        );
        engine.add_carrier(carrier);
    }

    fn find_vetted_seed(id: &str) -> u64 {
        // Pick a base seed for which the carrier passes vetting, so tests
        // exercise the normal path deterministically.
        (1..100)
            .find(|seed| {
                let engine = CarrierEngine::new(*seed);
                engine.vet_credentials(id)
            })
            .expect("some small seed passes vetting")
    }

    #[test]
    fn test_vetting_deterministic_and_scoped() {
        let engine = CarrierEngine::new(1234);
        let first = engine.vet_credentials("carrier_000001");
        let second = engine.vet_credentials("carrier_000001");
        assert_eq!(first, second, "vetting must be stable per carrier");
    }

    #[test]
    fn test_offer_generation_specialist_pricing() {
        let seed = find_vetted_seed("carrier_000001");
        let mut engine = CarrierEngine::new(seed);
        let mut rng = RngManager::new(seed);
        add_test_carrier(&mut engine, "carrier_000001", &mut rng);

        let market = steel_market();
        let lane = test_lane();
        let mut log = NotificationLog::new();

        let offer = engine
            .generate_offer(&lane, "STEEL", 10, 500.0, &market, 0.0, &mut rng, &mut log)
            .unwrap();

        // 6000 × 10 × (100000/100000) × 1.0 pricing × 0.9 specialist = 54000
        assert_eq!(offer.price, 54_000);
        assert_eq!(offer.carrier_id, "carrier_000001");
        assert_eq!(offer.expires_at, OFFER_VALIDITY);
        assert!(matches!(
            log.entries()[0],
            Notification::CarrierOfferMade { .. }
        ));
    }

    #[test]
    fn test_offer_rejects_restricted_cargo() {
        let mut engine = CarrierEngine::new(1);
        let mut rng = RngManager::new(1);
        add_test_carrier(&mut engine, "carrier_000001", &mut rng);

        let market = steel_market();
        let mut lane = test_lane();
        lane.add_restriction("STEEL");
        let mut log = NotificationLog::new();

        assert_eq!(
            engine.generate_offer(&lane, "STEEL", 10, 500.0, &market, 0.0, &mut rng, &mut log),
            Err(CarrierEngineError::CargoRestricted("STEEL".to_string()))
        );
    }

    #[test]
    fn test_offer_requires_eligible_carrier() {
        let seed = find_vetted_seed("carrier_000001");
        let mut engine = CarrierEngine::new(seed);
        let mut rng = RngManager::new(seed);
        add_test_carrier(&mut engine, "carrier_000001", &mut rng);
        engine.carrier_mut("carrier_000001").unwrap().mark_busy_until(1_000.0);

        let market = steel_market();
        let lane = test_lane();
        let mut log = NotificationLog::new();

        assert_eq!(
            engine.generate_offer(&lane, "STEEL", 10, 500.0, &market, 0.0, &mut rng, &mut log),
            Err(CarrierEngineError::NoEligibleCarriers)
        );
    }

    #[test]
    fn test_accept_offer_marks_busy() {
        let seed = find_vetted_seed("carrier_000001");
        let mut engine = CarrierEngine::new(seed);
        let mut rng = RngManager::new(seed);
        add_test_carrier(&mut engine, "carrier_000001", &mut rng);

        let market = steel_market();
        let lane = test_lane();
        let mut log = NotificationLog::new();

        let offer = engine
            .generate_offer(&lane, "STEEL", 10, 500.0, &market, 0.0, &mut rng, &mut log)
            .unwrap();
        let job_id = engine.accept_offer(&offer, 0.0, &mut log).unwrap();

        let contract = engine.contract(&job_id).unwrap();
        assert!(contract.is_active());
        assert_eq!(contract.expected_completion(), offer.estimated_time);

        let carrier = engine.carrier("carrier_000001").unwrap();
        assert_eq!(carrier.busy_until(), offer.estimated_time);
        assert_eq!(carrier.active_contracts(), [job_id]);
    }

    #[test]
    fn test_accept_expired_offer_rejected() {
        let seed = find_vetted_seed("carrier_000001");
        let mut engine = CarrierEngine::new(seed);
        let mut rng = RngManager::new(seed);
        add_test_carrier(&mut engine, "carrier_000001", &mut rng);

        let offer = CarrierOffer {
            carrier_id: "carrier_000001".to_string(),
            lane_id: "lane_ab".to_string(),
            cargo_type: "STEEL".to_string(),
            amount: 10,
            price: 50_000,
            estimated_time: 20.0,
            deadline: 500.0,
            expires_at: 30.0,
        };
        let mut log = NotificationLog::new();

        assert_eq!(
            engine.accept_offer(&offer, 31.0, &mut log),
            Err(CarrierEngineError::OfferExpired(30.0))
        );
    }

    #[test]
    fn test_negotiation_flexible_midpoint_scenario() {
        // Flexible carrier, original 1000, counter 700, zero-reputation
        // threshold 0.80 ⇒ 700 < 800 ⇒ midpoint counter 850.
        let mut engine = CarrierEngine::new(1);
        let mut style_rng = RngManager::new(1);
        loop {
            // Redraw until the test carrier lands on Flexible
            let carrier = Carrier::new(
                "carrier_000001",
                "Flexible Freight",
                60.0,
                2,
                1.0,
                0.5,
                1.0,
                Default::default(),
                &mut style_rng,
            );
            if carrier.style() == crate::models::carrier::NegotiationStyle::Flexible {
                engine.carriers.insert(carrier.id().to_string(), carrier);
                break;
            }
        }

        let offer = CarrierOffer {
            carrier_id: "carrier_000001".to_string(),
            lane_id: "lane_ab".to_string(),
            cargo_type: "STEEL".to_string(),
            amount: 10,
            price: 1000,
            estimated_time: 20.0,
            deadline: 500.0,
            expires_at: 30.0,
        };

        let response = engine.negotiate_offer(&offer, 700, 0.0, 0.0).unwrap();
        assert_eq!(response, NegotiationResponse::Counter { price: 850 });

        // At or above threshold the counter is accepted as-is
        let response = engine.negotiate_offer(&offer, 800, 0.0, 0.0).unwrap();
        assert_eq!(response, NegotiationResponse::Accepted { price: 800 });
    }

    #[test]
    fn test_negotiation_styles_and_reputation_discount() {
        use crate::models::carrier::NegotiationStyle;

        let mut engine = CarrierEngine::new(1);
        let mut style_rng = RngManager::new(1);
        // Collect one carrier per style
        let mut ids: BTreeMap<NegotiationStyle, String> = BTreeMap::new();
        let mut n = 0;
        while ids.len() < 4 {
            n += 1;
            let id = format!("carrier_{:06}", n);
            let carrier = Carrier::new(
                &id,
                "Any",
                60.0,
                2,
                1.0,
                0.5,
                1.0,
                Default::default(),
                &mut style_rng,
            );
            ids.entry(carrier.style()).or_insert_with(|| id.clone());
            engine.carriers.insert(id, carrier);
        }

        let offer_for = |carrier_id: &str| CarrierOffer {
            carrier_id: carrier_id.to_string(),
            lane_id: "lane_ab".to_string(),
            cargo_type: "STEEL".to_string(),
            amount: 10,
            price: 1000,
            estimated_time: 20.0,
            deadline: 500.0,
            expires_at: 30.0,
        };

        // Firm rejects a lowball outright
        let firm = offer_for(&ids[&NegotiationStyle::Firm]);
        assert_eq!(
            engine.negotiate_offer(&firm, 500, 0.0, 0.0).unwrap(),
            NegotiationResponse::Rejected
        );

        // Aggressive counters above the original price
        let aggressive = offer_for(&ids[&NegotiationStyle::Aggressive]);
        assert_eq!(
            engine.negotiate_offer(&aggressive, 500, 0.0, 0.0).unwrap(),
            NegotiationResponse::Counter { price: 1050 }
        );

        // Fair counters 95% of original, but at least 10% over the counter
        let fair = offer_for(&ids[&NegotiationStyle::Fair]);
        assert_eq!(
            engine.negotiate_offer(&fair, 500, 0.0, 0.0).unwrap(),
            NegotiationResponse::Counter { price: 950 }
        );
        assert_eq!(
            engine.negotiate_offer(&fair, 900, 0.0, 0.0).unwrap(),
            NegotiationResponse::Counter { price: 990 }
        );

        // Max reputation shaves 0.10 off the threshold: firm 0.95 → 0.85
        assert_eq!(
            engine.negotiate_offer(&firm, 850, 100.0, 0.0).unwrap(),
            NegotiationResponse::Accepted { price: 850 }
        );
    }

    #[test]
    fn test_delivery_resolution_updates_history() {
        let seed = find_vetted_seed("carrier_000001");
        let mut engine = CarrierEngine::new(seed);
        let mut rng = RngManager::new(seed);
        add_test_carrier(&mut engine, "carrier_000001", &mut rng);

        let market = steel_market();
        let lane = test_lane();
        let mut log = NotificationLog::new();

        let offer = engine
            .generate_offer(&lane, "STEEL", 10, 500.0, &market, 0.0, &mut rng, &mut log)
            .unwrap();
        let job_id = engine.accept_offer(&offer, 0.0, &mut log).unwrap();

        // Nothing resolves before the expected completion
        let early = engine.process_tick(offer.estimated_time - 1.0, &mut rng, &mut log);
        assert!(early.is_empty());

        let resolutions = engine.process_tick(offer.estimated_time + 5.0, &mut rng, &mut log);
        assert_eq!(resolutions.len(), 1);
        let resolution = &resolutions[0];
        assert_eq!(resolution.contract_id, job_id);
        assert!(resolution.on_time, "deadline 500 is far in the future");

        let carrier = engine.carrier("carrier_000001").unwrap();
        assert_eq!(carrier.history().total_deliveries(), 1);
        assert!(carrier.active_contracts().is_empty());

        if resolution.success {
            assert!(resolution.quality > 0.0);
            assert_eq!(
                engine.contract(&job_id).unwrap().status(),
                CarrierContractStatus::Completed
            );
        } else {
            assert_eq!(
                engine.contract(&job_id).unwrap().status(),
                CarrierContractStatus::Failed
            );
            assert!(carrier.reputation() < 60.0);
        }
    }

    #[test]
    fn test_disruption_fails_jobs_without_reputation_penalty() {
        let seed = find_vetted_seed("carrier_000001");
        let mut engine = CarrierEngine::new(seed);
        let mut rng = RngManager::new(seed);
        add_test_carrier(&mut engine, "carrier_000001", &mut rng);

        let market = steel_market();
        let lane = test_lane();
        let mut log = NotificationLog::new();

        let offer = engine
            .generate_offer(&lane, "STEEL", 10, 500.0, &market, 0.0, &mut rng, &mut log)
            .unwrap();
        let job_id = engine.accept_offer(&offer, 0.0, &mut log).unwrap();

        let reputation_before = engine.carrier("carrier_000001").unwrap().reputation();
        engine.handle_disruption("carrier_000001", "lane_ab", 5.0, &mut log);

        assert_eq!(
            engine.contract(&job_id).unwrap().status(),
            CarrierContractStatus::Failed
        );
        let carrier = engine.carrier("carrier_000001").unwrap();
        assert_eq!(carrier.reputation(), reputation_before);
        assert_eq!(carrier.history().total_deliveries(), 0);
        assert!(carrier.active_contracts().is_empty());
        assert!(log
            .entries()
            .iter()
            .any(|n| matches!(n, Notification::CarrierDisrupted { .. })));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let seed = find_vetted_seed("carrier_000001");
        let mut engine = CarrierEngine::new(seed);
        let mut rng = RngManager::new(seed);
        add_test_carrier(&mut engine, "carrier_000001", &mut rng);

        let market = steel_market();
        let lane = test_lane();
        let mut log = NotificationLog::new();
        let offer = engine
            .generate_offer(&lane, "STEEL", 10, 500.0, &market, 0.0, &mut rng, &mut log)
            .unwrap();
        engine.accept_offer(&offer, 0.0, &mut log).unwrap();

        let restored = CarrierEngine::from_snapshot(engine.to_snapshot());

        assert_eq!(
            restored.carrier("carrier_000001"),
            engine.carrier("carrier_000001")
        );
        assert_eq!(
            restored.contracts().count(),
            engine.contracts().count()
        );
        assert_eq!(restored.next_contract_id, engine.next_contract_id);
    }
}
