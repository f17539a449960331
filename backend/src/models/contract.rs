//! Contract models
//!
//! Two independent lifecycles share this module: customer contracts
//! (pending → active → completed/failed, with an accept-by expiration on the
//! pending phase) and carrier contracts (active → completed/failed, resolved
//! when the expected completion time passes). Carrier offers are ephemeral
//! values consumed by accept/reject/negotiate and never stored.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Customer contract lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractStatus {
    /// Offered, awaiting player acceptance
    Pending,
    /// Accepted, in progress
    Active,
    /// Fulfilled (terminal)
    Completed,
    /// Failed or expired unaccepted (terminal)
    Failed,
}

/// Carrier contract lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CarrierContractStatus {
    Active,
    Completed,
    Failed,
}

/// Contract operation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractError {
    #[error("Contract is not pending")]
    NotPending,

    #[error("Contract offer expired at {0}")]
    OfferExpired(f64),

    #[error("Contract is not active")]
    NotActive,

    #[error("Contract is already resolved")]
    AlreadyResolved,
}

/// A freight contract offered by a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerContract {
    id: String,
    customer_id: String,
    cargo_type: String,
    amount: u32,
    /// Payout on success (whole currency units)
    value: i64,
    /// Paid by the player on acceptance (10% of value)
    upfront_cost: i64,
    /// Charged on failure (20% of value)
    penalty: i64,
    start_time: f64,
    /// Delivery deadline once accepted
    deadline: f64,
    /// Accept-by time for the pending phase
    expiration_time: f64,
    status: ContractStatus,
    /// Difficulty from the customer tier, 0.33..1.0
    difficulty: f64,
}

impl CustomerContract {
    /// Create a pending contract. Upfront cost and penalty are derived from
    /// the value (10% and 20% respectively).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        customer_id: impl Into<String>,
        cargo_type: impl Into<String>,
        amount: u32,
        value: i64,
        start_time: f64,
        deadline: f64,
        expiration_time: f64,
        difficulty: f64,
    ) -> Self {
        assert!(amount > 0, "amount must be positive");
        assert!(value >= 0, "value must be non-negative");
        Self {
            id: id.into(),
            customer_id: customer_id.into(),
            cargo_type: cargo_type.into(),
            amount,
            value,
            upfront_cost: value / 10,
            penalty: value / 5,
            start_time,
            deadline,
            expiration_time,
            status: ContractStatus::Pending,
            difficulty: difficulty.clamp(0.0, 1.0),
        }
    }

    /// Restore a contract from checkpointed state, status included.
    #[allow(clippy::too_many_arguments)]
    pub fn from_snapshot(
        id: String,
        customer_id: String,
        cargo_type: String,
        amount: u32,
        value: i64,
        start_time: f64,
        deadline: f64,
        expiration_time: f64,
        status: ContractStatus,
        difficulty: f64,
    ) -> Self {
        let mut contract = Self::new(
            id,
            customer_id,
            cargo_type,
            amount,
            value,
            start_time,
            deadline,
            expiration_time,
            difficulty,
        );
        contract.status = status;
        contract
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn cargo_type(&self) -> &str {
        &self.cargo_type
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn upfront_cost(&self) -> i64 {
        self.upfront_cost
    }

    pub fn penalty(&self) -> i64 {
        self.penalty
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn deadline(&self) -> f64 {
        self.deadline
    }

    pub fn expiration_time(&self) -> f64 {
        self.expiration_time
    }

    pub fn status(&self) -> ContractStatus {
        self.status
    }

    pub fn difficulty(&self) -> f64 {
        self.difficulty
    }

    pub fn is_pending(&self) -> bool {
        self.status == ContractStatus::Pending
    }

    pub fn is_active(&self) -> bool {
        self.status == ContractStatus::Active
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, ContractStatus::Completed | ContractStatus::Failed)
    }

    /// True once the accept-by time has strictly passed.
    ///
    /// Accepting exactly at `expiration_time` is still valid.
    pub fn is_offer_expired(&self, now: f64) -> bool {
        now > self.expiration_time
    }

    /// Accept the pending offer at `now`.
    pub fn accept(&mut self, now: f64) -> Result<(), ContractError> {
        if self.status != ContractStatus::Pending {
            return Err(ContractError::NotPending);
        }
        if self.is_offer_expired(now) {
            return Err(ContractError::OfferExpired(self.expiration_time));
        }
        self.status = ContractStatus::Active;
        Ok(())
    }

    /// Resolve an active contract as completed or failed (terminal).
    pub fn resolve(&mut self, success: bool) -> Result<(), ContractError> {
        if self.status != ContractStatus::Active {
            return Err(if self.is_terminal() {
                ContractError::AlreadyResolved
            } else {
                ContractError::NotActive
            });
        }
        self.status = if success {
            ContractStatus::Completed
        } else {
            ContractStatus::Failed
        };
        Ok(())
    }

    /// Expire a pending offer that was never accepted (terminal).
    pub fn expire(&mut self) -> Result<(), ContractError> {
        if self.status != ContractStatus::Pending {
            return Err(ContractError::NotPending);
        }
        self.status = ContractStatus::Failed;
        Ok(())
    }
}

/// Ephemeral carrier offer: produced by the carrier engine, consumed
/// immediately by accept/reject/negotiate. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierOffer {
    pub carrier_id: String,
    pub lane_id: String,
    pub cargo_type: String,
    pub amount: u32,
    /// Quoted price (whole currency units)
    pub price: i64,
    /// Estimated transit time in simulated seconds
    pub estimated_time: f64,
    /// Delivery deadline the carrier commits to
    pub deadline: f64,
    /// Game time at which the quote lapses
    pub expires_at: f64,
}

impl CarrierOffer {
    pub fn is_expired(&self, now: f64) -> bool {
        now > self.expires_at
    }
}

/// An accepted carrier delivery job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierContract {
    id: String,
    carrier_id: String,
    lane_id: String,
    cargo_type: String,
    amount: u32,
    price: i64,
    start_time: f64,
    /// When the delivery is expected to finish (resolution trigger)
    expected_completion: f64,
    /// Commitment deadline; finishing after it is classified late
    deadline: f64,
    status: CarrierContractStatus,
    /// Delivery quality, 0..1; meaningful once completed
    quality: f64,
}

impl CarrierContract {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        carrier_id: impl Into<String>,
        lane_id: impl Into<String>,
        cargo_type: impl Into<String>,
        amount: u32,
        price: i64,
        start_time: f64,
        expected_completion: f64,
        deadline: f64,
    ) -> Self {
        Self {
            id: id.into(),
            carrier_id: carrier_id.into(),
            lane_id: lane_id.into(),
            cargo_type: cargo_type.into(),
            amount,
            price,
            start_time,
            expected_completion,
            deadline,
            status: CarrierContractStatus::Active,
            quality: 0.0,
        }
    }

    /// Restore a carrier contract from checkpointed state.
    #[allow(clippy::too_many_arguments)]
    pub fn from_snapshot(
        id: String,
        carrier_id: String,
        lane_id: String,
        cargo_type: String,
        amount: u32,
        price: i64,
        start_time: f64,
        expected_completion: f64,
        deadline: f64,
        status: CarrierContractStatus,
        quality: f64,
    ) -> Self {
        let mut contract = Self::new(
            id,
            carrier_id,
            lane_id,
            cargo_type,
            amount,
            price,
            start_time,
            expected_completion,
            deadline,
        );
        contract.status = status;
        contract.quality = quality;
        contract
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn carrier_id(&self) -> &str {
        &self.carrier_id
    }

    pub fn lane_id(&self) -> &str {
        &self.lane_id
    }

    pub fn cargo_type(&self) -> &str {
        &self.cargo_type
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn price(&self) -> i64 {
        self.price
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn expected_completion(&self) -> f64 {
        self.expected_completion
    }

    pub fn deadline(&self) -> f64 {
        self.deadline
    }

    pub fn status(&self) -> CarrierContractStatus {
        self.status
    }

    pub fn quality(&self) -> f64 {
        self.quality
    }

    pub fn is_active(&self) -> bool {
        self.status == CarrierContractStatus::Active
    }

    /// True once the expected completion time has been reached.
    pub fn is_due(&self, now: f64) -> bool {
        self.expected_completion <= now
    }

    /// On-time classification: finished at or before the deadline.
    pub fn is_on_time(&self, now: f64) -> bool {
        now <= self.deadline
    }

    pub fn complete(&mut self, quality: f64) -> Result<(), ContractError> {
        if self.status != CarrierContractStatus::Active {
            return Err(ContractError::AlreadyResolved);
        }
        self.status = CarrierContractStatus::Completed;
        self.quality = quality.clamp(0.0, 1.0);
        Ok(())
    }

    pub fn fail(&mut self) -> Result<(), ContractError> {
        if self.status != CarrierContractStatus::Active {
            return Err(ContractError::AlreadyResolved);
        }
        self.status = CarrierContractStatus::Failed;
        self.quality = 0.0;
        Ok(())
    }
}
