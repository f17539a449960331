//! Customer contract engine
//!
//! Generates freight contracts for customers, prices them off the market,
//! and drives the pending → active → completed/failed lifecycle, including
//! the per-tick expiration sweep (with its trust penalty) and the
//! randomized-interval generation scheduler.
//!
//! Money never changes hands here: accept/complete return the amounts
//! involved and the simulation root applies them to the player ledger, so
//! an engine call is always all-or-nothing.

use crate::market::MarketEngine;
use crate::models::contract::{ContractError, ContractStatus, CustomerContract};
use crate::models::customer::{Customer, CustomerError};
use crate::models::notification::{Notification, NotificationLog};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Seconds between eligibility checks of the generation scheduler.
pub const CONTRACT_CHECK_INTERVAL: f64 = 5.0;

/// Bounds of the randomized generation interval, in simulated seconds.
pub const GENERATION_INTERVAL: (f64, f64) = (30.0, 120.0);

/// Seconds a customer sits out after a contract is generated for them.
pub const CUSTOMER_COOLDOWN: f64 = 60.0;

/// Seconds a pending contract stays acceptable.
pub const OFFER_EXPIRATION: f64 = 60.0;

/// Markup applied on top of the raw commodity value.
const CONTRACT_MARKUP: f64 = 1.5;

/// Contract engine errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractEngineError {
    #[error("Unknown customer: {0}")]
    UnknownCustomer(String),

    #[error("Unknown contract: {0}")]
    UnknownContract(String),

    #[error(transparent)]
    Customer(#[from] CustomerError),

    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// Amounts involved in accepting a contract, applied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptOutcome {
    pub contract_id: String,
    pub customer_id: String,
    pub upfront_cost: i64,
}

/// Amounts and adjustments from resolving a contract, applied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionOutcome {
    pub contract_id: String,
    pub customer_id: String,
    pub success: bool,
    /// Payout on success (0 on failure)
    pub payout: i64,
    /// Penalty charge on failure (0 on success)
    pub penalty: i64,
    /// XP the player earns (0 on failure)
    pub experience: u64,
}

/// The customer contract engine.
#[derive(Debug, Clone, Default)]
pub struct ContractEngine {
    customers: BTreeMap<String, Customer>,
    contracts: BTreeMap<String, CustomerContract>,
    /// Per-customer generation cooldowns (game time)
    cooldowns: BTreeMap<String, f64>,
    next_contract_id: u64,
    next_check_at: f64,
    next_generation_at: f64,
}

impl ContractEngine {
    pub fn new() -> Self {
        Self {
            next_contract_id: 1,
            ..Self::default()
        }
    }

    // ========================================================================
    // Access
    // ========================================================================

    pub fn add_customer(&mut self, customer: Customer) {
        self.customers.insert(customer.id().to_string(), customer);
    }

    pub fn customer(&self, id: &str) -> Option<&Customer> {
        self.customers.get(id)
    }

    pub fn customer_mut(&mut self, id: &str) -> Option<&mut Customer> {
        self.customers.get_mut(id)
    }

    pub fn customers(&self) -> impl Iterator<Item = &Customer> {
        self.customers.values()
    }

    pub fn contract(&self, id: &str) -> Option<&CustomerContract> {
        self.contracts.get(id)
    }

    pub fn contracts(&self) -> impl Iterator<Item = &CustomerContract> {
        self.contracts.values()
    }

    pub fn pending_contracts(&self) -> impl Iterator<Item = &CustomerContract> {
        self.contracts.values().filter(|c| c.is_pending())
    }

    pub fn active_contracts(&self) -> impl Iterator<Item = &CustomerContract> {
        self.contracts.values().filter(|c| c.is_active())
    }

    /// Expected payout across active contracts (used for net worth).
    pub fn expected_profit(&self) -> i64 {
        self.active_contracts().map(|c| c.value()).sum()
    }

    // ========================================================================
    // Generation
    // ========================================================================

    /// Generate a pending contract for a customer.
    ///
    /// Rejected for blacklisted customers, customers without positive needs,
    /// and customers at the active-contract cap. Cargo is drawn by weighted
    /// random over the need map; value is the commodity price × amount ×
    /// markup × tier multiplier.
    pub fn generate_contract(
        &mut self,
        customer_id: &str,
        market: &MarketEngine,
        now: f64,
        rng: &mut RngManager,
        log: &mut NotificationLog,
    ) -> Result<String, ContractEngineError> {
        let customer = self
            .customers
            .get_mut(customer_id)
            .ok_or_else(|| ContractEngineError::UnknownCustomer(customer_id.to_string()))?;

        if customer.is_blacklisted() {
            return Err(CustomerError::Blacklisted.into());
        }
        if customer.is_at_contract_cap() {
            return Err(CustomerError::AtContractCap.into());
        }

        // Sorted for deterministic RNG consumption
        let mut needs: Vec<(&String, f64)> = customer
            .needs()
            .iter()
            .filter(|(_, w)| **w > 0.0)
            .map(|(k, w)| (k, *w))
            .collect();
        needs.sort_by(|a, b| a.0.cmp(b.0));

        if needs.is_empty() {
            return Err(CustomerError::NoNeeds.into());
        }

        let weights: Vec<f64> = needs.iter().map(|(_, w)| *w).collect();
        let idx = rng.weighted_index(&weights).expect("needs is non-empty");
        let cargo_type = needs[idx].0.clone();

        let amount = rng.range(5, 51) as u32;
        let tier = customer.tier();
        let unit_price = market.get_price(&cargo_type, now, None);
        let value =
            (unit_price * amount as f64 * CONTRACT_MARKUP * tier.value_multiplier()).round() as i64;

        let deadline = now + 300.0 + 60.0 * (3 - tier.level()) as f64;
        let expiration = now + OFFER_EXPIRATION;

        let contract_id = format!("contract_{:06}", self.next_contract_id);
        self.next_contract_id += 1;

        let contract = CustomerContract::new(
            contract_id.clone(),
            customer_id,
            cargo_type.clone(),
            amount,
            value,
            now,
            deadline,
            expiration,
            tier.difficulty(),
        );

        customer.record_offer();
        self.cooldowns.insert(customer_id.to_string(), now + CUSTOMER_COOLDOWN);
        self.contracts.insert(contract_id.clone(), contract);

        log.push(Notification::ContractOffered {
            time: now,
            contract_id: contract_id.clone(),
            customer_id: customer_id.to_string(),
            cargo_type,
            value,
        });

        Ok(contract_id)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Accept a pending contract. Fails if the offer expired, the contract
    /// is not pending, or the customer hit their cap meanwhile.
    pub fn accept_contract(
        &mut self,
        contract_id: &str,
        now: f64,
        log: &mut NotificationLog,
    ) -> Result<AcceptOutcome, ContractEngineError> {
        let contract = self
            .contracts
            .get_mut(contract_id)
            .ok_or_else(|| ContractEngineError::UnknownContract(contract_id.to_string()))?;

        let customer_id = contract.customer_id().to_string();
        let customer = self
            .customers
            .get_mut(&customer_id)
            .ok_or_else(|| ContractEngineError::UnknownCustomer(customer_id.clone()))?;

        if customer.is_at_contract_cap() {
            return Err(CustomerError::AtContractCap.into());
        }

        contract.accept(now)?;
        customer
            .add_active_contract(contract_id)
            .expect("cap checked above");

        log.push(Notification::ContractAccepted {
            time: now,
            contract_id: contract_id.to_string(),
        });

        Ok(AcceptOutcome {
            contract_id: contract_id.to_string(),
            customer_id,
            upfront_cost: contract.upfront_cost(),
        })
    }

    /// Resolve an active contract. Success adds trust (5 × difficulty) and
    /// earns XP; failure removes trust (10 × difficulty) and charges the
    /// penalty.
    pub fn complete_contract(
        &mut self,
        contract_id: &str,
        success: bool,
        now: f64,
        log: &mut NotificationLog,
    ) -> Result<ResolutionOutcome, ContractEngineError> {
        let contract = self
            .contracts
            .get_mut(contract_id)
            .ok_or_else(|| ContractEngineError::UnknownContract(contract_id.to_string()))?;

        contract.resolve(success)?;

        let customer_id = contract.customer_id().to_string();
        let difficulty = contract.difficulty();
        let value = contract.value();
        let penalty = contract.penalty();

        if let Some(customer) = self.customers.get_mut(&customer_id) {
            let trust_delta = if success {
                5.0 * difficulty
            } else {
                -10.0 * difficulty
            };
            customer.adjust_trust(trust_delta);
            customer.resolve_contract(contract_id, success);
        }

        let outcome = if success {
            log.push(Notification::ContractCompleted {
                time: now,
                contract_id: contract_id.to_string(),
                profit: value,
            });
            ResolutionOutcome {
                contract_id: contract_id.to_string(),
                customer_id,
                success: true,
                payout: value,
                penalty: 0,
                experience: ((value / 100).max(10)) as u64,
            }
        } else {
            log.push(Notification::ContractFailed {
                time: now,
                contract_id: contract_id.to_string(),
                penalty,
            });
            ResolutionOutcome {
                contract_id: contract_id.to_string(),
                customer_id,
                success: false,
                payout: 0,
                penalty,
                experience: 0,
            }
        };

        Ok(outcome)
    }

    /// Decline a pending contract outright. The contract terminates
    /// without the expiration trust penalty — declining is politer than
    /// letting the offer lapse.
    pub fn decline_contract(
        &mut self,
        contract_id: &str,
        now: f64,
        log: &mut NotificationLog,
    ) -> Result<(), ContractEngineError> {
        let contract = self
            .contracts
            .get_mut(contract_id)
            .ok_or_else(|| ContractEngineError::UnknownContract(contract_id.to_string()))?;

        contract.expire()?;

        log.push(Notification::ContractExpired {
            time: now,
            contract_id: contract_id.to_string(),
            customer_id: contract.customer_id().to_string(),
        });
        Ok(())
    }

    // ========================================================================
    // Schedulers
    // ========================================================================

    /// Expiration sweep, run every tick: pending contracts past their
    /// accept-by time expire with a −2 trust penalty to the customer.
    pub fn sweep_expired(&mut self, now: f64, log: &mut NotificationLog) -> Vec<String> {
        let expired_ids: Vec<String> = self
            .contracts
            .values()
            .filter(|c| c.is_pending() && c.is_offer_expired(now))
            .map(|c| c.id().to_string())
            .collect();

        for contract_id in &expired_ids {
            let contract = self.contracts.get_mut(contract_id).expect("id from scan");
            if contract.expire().is_err() {
                continue;
            }
            let customer_id = contract.customer_id().to_string();

            if let Some(customer) = self.customers.get_mut(&customer_id) {
                customer.adjust_trust(-2.0);
            }

            log.push(Notification::ContractExpired {
                time: now,
                contract_id: contract_id.clone(),
                customer_id,
            });
        }

        expired_ids
    }

    /// Periodic generation check. Every `CONTRACT_CHECK_INTERVAL` seconds,
    /// if the randomized inter-arrival gate has passed, draw one eligible
    /// customer at random and generate a contract for them; then recompute
    /// the gate uniformly in [30, 120] seconds.
    pub fn process_tick(
        &mut self,
        now: f64,
        market: &MarketEngine,
        rng: &mut RngManager,
        log: &mut NotificationLog,
    ) {
        if now < self.next_check_at {
            return;
        }
        self.next_check_at = now + CONTRACT_CHECK_INTERVAL;

        if now < self.next_generation_at {
            return;
        }

        let eligible: Vec<String> = self
            .customers
            .values()
            .filter(|c| {
                !c.is_blacklisted()
                    && !c.is_at_contract_cap()
                    && c.needs().values().any(|w| *w > 0.0)
                    && self.cooldowns.get(c.id()).map(|t| *t <= now).unwrap_or(true)
            })
            .map(|c| c.id().to_string())
            .collect();

        if !eligible.is_empty() {
            let idx = rng.range(0, eligible.len() as i64) as usize;
            let customer_id = eligible[idx].clone();
            if let Err(err) = self.generate_contract(&customer_id, market, now, rng, log) {
                // Eligibility was just checked; a rejection here is benign
                // and must not abort the tick
                log::warn!("contract generation skipped for {customer_id}: {err}");
            }
        }

        self.next_generation_at = now + rng.uniform(GENERATION_INTERVAL.0, GENERATION_INTERVAL.1);
    }

    /// Daily pass: drop cooldown entries that have lapsed.
    pub fn process_daily_update(&mut self, now: f64) {
        self.cooldowns.retain(|_, until| *until > now);
    }

    // ========================================================================
    // Snapshot
    // ========================================================================

    pub fn to_snapshot(&self) -> ContractEngineSnapshot {
        ContractEngineSnapshot {
            customers: self.customers.values().cloned().collect(),
            contracts: self
                .contracts
                .values()
                .map(|c| CustomerContractSnapshot {
                    id: c.id().to_string(),
                    customer_id: c.customer_id().to_string(),
                    cargo_type: c.cargo_type().to_string(),
                    amount: c.amount(),
                    value: c.value(),
                    start_time: c.start_time(),
                    deadline: c.deadline(),
                    expiration_time: c.expiration_time(),
                    status: c.status(),
                    difficulty: c.difficulty(),
                })
                .collect(),
            cooldowns: self.cooldowns.clone(),
            next_contract_id: self.next_contract_id,
            next_check_at: self.next_check_at,
            next_generation_at: self.next_generation_at,
        }
    }

    pub fn from_snapshot(snapshot: ContractEngineSnapshot) -> Self {
        let mut engine = Self::new();
        for customer in snapshot.customers {
            engine.customers.insert(customer.id().to_string(), customer);
        }
        for c in snapshot.contracts {
            engine.contracts.insert(
                c.id.clone(),
                CustomerContract::from_snapshot(
                    c.id,
                    c.customer_id,
                    c.cargo_type,
                    c.amount,
                    c.value,
                    c.start_time,
                    c.deadline,
                    c.expiration_time,
                    c.status,
                    c.difficulty,
                ),
            );
        }
        engine.cooldowns = snapshot.cooldowns;
        engine.next_contract_id = snapshot.next_contract_id;
        engine.next_check_at = snapshot.next_check_at;
        engine.next_generation_at = snapshot.next_generation_at;
        engine
    }
}

/// Serialized contract state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerContractSnapshot {
    pub id: String,
    pub customer_id: String,
    pub cargo_type: String,
    pub amount: u32,
    pub value: i64,
    pub start_time: f64,
    pub deadline: f64,
    pub expiration_time: f64,
    pub status: ContractStatus,
    pub difficulty: f64,
}

/// Serialized contract engine state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractEngineSnapshot {
    pub customers: Vec<Customer>,
    pub contracts: Vec<CustomerContractSnapshot>,
    pub cooldowns: BTreeMap<String, f64>,
    pub next_contract_id: u64,
    pub next_check_at: f64,
    pub next_generation_at: f64,
}
