//! Customer model
//!
//! Customers hold a trust score that drives their tier (and the contract
//! value multiplier), a need map used for weighted-random cargo selection,
//! and the blacklist flag. Blacklisting is a live recomputation from trust
//! after every mutation, not a sticky state: trust ≤ 10 blacklists, trust
//! above 10 un-blacklists.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Maximum concurrent active contracts per customer.
pub const CUSTOMER_CONTRACT_CAP: usize = 3;

/// Customer trust bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CustomerTier {
    Basic,
    Standard,
    Preferred,
    Premium,
}

impl CustomerTier {
    /// Derive the tier from a trust value (thresholds 40/70/90).
    pub fn from_trust(trust: f64) -> Self {
        if trust >= 90.0 {
            CustomerTier::Premium
        } else if trust >= 70.0 {
            CustomerTier::Preferred
        } else if trust >= 40.0 {
            CustomerTier::Standard
        } else {
            CustomerTier::Basic
        }
    }

    /// Contract value multiplier for this tier.
    pub fn value_multiplier(self) -> f64 {
        match self {
            CustomerTier::Basic => 0.8,
            CustomerTier::Standard => 1.0,
            CustomerTier::Preferred => 1.2,
            CustomerTier::Premium => 1.5,
        }
    }

    /// Tier level, 0 (basic) … 3 (premium).
    pub fn level(self) -> u32 {
        match self {
            CustomerTier::Basic => 0,
            CustomerTier::Standard => 1,
            CustomerTier::Preferred => 2,
            CustomerTier::Premium => 3,
        }
    }

    /// Contract difficulty for this tier, in [0.33, 1.0].
    pub fn difficulty(self) -> f64 {
        (((self.level() + 1) as f64) / 3.0).min(1.0)
    }
}

/// Customer operation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CustomerError {
    #[error("Customer is blacklisted")]
    Blacklisted,

    #[error("Customer has no positive cargo needs")]
    NoNeeds,

    #[error("Customer is at the active contract cap")]
    AtContractCap,
}

/// A freight customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    id: String,
    name: String,
    /// Trust score, 0..100
    trust: f64,
    /// Cargo type → demand weight (used for weighted-random selection)
    needs: HashMap<String, f64>,
    /// Ids of active (accepted, unresolved) contracts
    active_contracts: Vec<String>,
    /// Recomputed from trust after every mutation
    blacklisted: bool,
    contracts_offered: u32,
    contracts_succeeded: u32,
    contracts_failed: u32,
}

impl Customer {
    pub fn new(id: impl Into<String>, name: impl Into<String>, trust: f64) -> Self {
        let trust = trust.clamp(0.0, 100.0);
        Self {
            id: id.into(),
            name: name.into(),
            trust,
            needs: HashMap::new(),
            active_contracts: Vec::new(),
            blacklisted: trust <= 10.0,
            contracts_offered: 0,
            contracts_succeeded: 0,
            contracts_failed: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trust(&self) -> f64 {
        self.trust
    }

    pub fn tier(&self) -> CustomerTier {
        CustomerTier::from_trust(self.trust)
    }

    pub fn is_blacklisted(&self) -> bool {
        self.blacklisted
    }

    pub fn needs(&self) -> &HashMap<String, f64> {
        &self.needs
    }

    pub fn set_need(&mut self, cargo_type: impl Into<String>, weight: f64) {
        self.needs.insert(cargo_type.into(), weight.max(0.0));
    }

    pub fn active_contracts(&self) -> &[String] {
        &self.active_contracts
    }

    pub fn is_at_contract_cap(&self) -> bool {
        self.active_contracts.len() >= CUSTOMER_CONTRACT_CAP
    }

    pub fn contracts_offered(&self) -> u32 {
        self.contracts_offered
    }

    pub fn contracts_succeeded(&self) -> u32 {
        self.contracts_succeeded
    }

    pub fn contracts_failed(&self) -> u32 {
        self.contracts_failed
    }

    /// Adjust trust by `delta`, clamping to [0, 100] and recomputing the
    /// blacklist flag. Returns the new trust value.
    pub fn adjust_trust(&mut self, delta: f64) -> f64 {
        self.trust = (self.trust + delta).clamp(0.0, 100.0);
        self.blacklisted = self.trust <= 10.0;
        self.trust
    }

    /// Set trust to an exact value (event effect reversal), recomputing the
    /// blacklist flag.
    pub fn set_trust(&mut self, trust: f64) {
        self.trust = trust.clamp(0.0, 100.0);
        self.blacklisted = self.trust <= 10.0;
    }

    pub fn record_offer(&mut self) {
        self.contracts_offered += 1;
    }

    /// Track a newly accepted contract.
    pub fn add_active_contract(&mut self, contract_id: impl Into<String>) -> Result<(), CustomerError> {
        if self.is_at_contract_cap() {
            return Err(CustomerError::AtContractCap);
        }
        self.active_contracts.push(contract_id.into());
        Ok(())
    }

    /// Remove a contract from the active set and bump the outcome counter.
    pub fn resolve_contract(&mut self, contract_id: &str, success: bool) {
        self.active_contracts.retain(|id| id != contract_id);
        if success {
            self.contracts_succeeded += 1;
        } else {
            self.contracts_failed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(CustomerTier::from_trust(10.0), CustomerTier::Basic);
        assert_eq!(CustomerTier::from_trust(39.9), CustomerTier::Basic);
        assert_eq!(CustomerTier::from_trust(40.0), CustomerTier::Standard);
        assert_eq!(CustomerTier::from_trust(70.0), CustomerTier::Preferred);
        assert_eq!(CustomerTier::from_trust(90.0), CustomerTier::Premium);
        assert_eq!(CustomerTier::from_trust(99.0), CustomerTier::Premium);
    }

    #[test]
    fn test_tier_multiplier_monotonic() {
        let multipliers: Vec<f64> = [10.0, 40.0, 70.0, 90.0, 99.0]
            .iter()
            .map(|t| CustomerTier::from_trust(*t).value_multiplier())
            .collect();
        assert_eq!(multipliers, vec![0.8, 1.0, 1.2, 1.5, 1.5]);
        assert!(multipliers.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_difficulty_range() {
        assert!((CustomerTier::Basic.difficulty() - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(CustomerTier::Premium.difficulty(), 1.0);
    }

    #[test]
    fn test_blacklist_is_live_not_sticky() {
        let mut customer = Customer::new("cust_001", "Meyer Logistics", 12.0);
        assert!(!customer.is_blacklisted());

        customer.adjust_trust(-2.0); // 10.0 → blacklisted
        assert!(customer.is_blacklisted());

        customer.adjust_trust(0.5); // 10.5 → un-blacklisted again
        assert!(!customer.is_blacklisted());
    }

    #[test]
    fn test_trust_clamped() {
        let mut customer = Customer::new("cust_001", "Meyer Logistics", 95.0);
        customer.adjust_trust(50.0);
        assert_eq!(customer.trust(), 100.0);
        customer.adjust_trust(-500.0);
        assert_eq!(customer.trust(), 0.0);
        assert!(customer.is_blacklisted());
    }

    #[test]
    fn test_contract_cap_enforced() {
        let mut customer = Customer::new("cust_001", "Meyer Logistics", 50.0);
        for i in 0..CUSTOMER_CONTRACT_CAP {
            customer.add_active_contract(format!("contract_{:06}", i)).unwrap();
        }
        assert_eq!(
            customer.add_active_contract("contract_000099"),
            Err(CustomerError::AtContractCap)
        );

        customer.resolve_contract("contract_000000", true);
        assert!(!customer.is_at_contract_cap());
        assert_eq!(customer.contracts_succeeded(), 1);
    }
}
