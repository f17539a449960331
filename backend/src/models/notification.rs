//! Change notifications for UI/audio collaborators.
//!
//! The core never calls collaborators directly: every observable change is
//! pushed onto an in-memory [`NotificationLog`] the collaborator drains once
//! per tick. Each notification is a pure data record stamped with the game
//! time it occurred at.

use crate::models::lane::{LaneStatus, RiskLevel};
use crate::models::world_event::{EventKind, EventOutcome};
use crate::player::ReputationScope;
use serde::{Deserialize, Serialize};

/// One observable state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Notification {
    /// Lane lifecycle status changed
    LaneStatusChanged {
        time: f64,
        lane_id: String,
        status: LaneStatus,
    },

    /// Lane congestion or risk changed (drift, effects, upgrades)
    LaneConditionChanged {
        time: f64,
        lane_id: String,
        congestion: f64,
        risk: RiskLevel,
    },

    /// A customer contract is on offer
    ContractOffered {
        time: f64,
        contract_id: String,
        customer_id: String,
        cargo_type: String,
        value: i64,
    },

    /// A pending contract was accepted
    ContractAccepted { time: f64, contract_id: String },

    /// An active contract completed successfully
    ContractCompleted {
        time: f64,
        contract_id: String,
        profit: i64,
    },

    /// An active contract failed
    ContractFailed {
        time: f64,
        contract_id: String,
        penalty: i64,
    },

    /// A pending contract expired unaccepted
    ContractExpired {
        time: f64,
        contract_id: String,
        customer_id: String,
    },

    /// A carrier quoted a job
    CarrierOfferMade {
        time: f64,
        carrier_id: String,
        lane_id: String,
        price: i64,
    },

    /// A carrier offer was accepted into a contract
    CarrierJobAccepted {
        time: f64,
        contract_id: String,
        carrier_id: String,
    },

    /// A carrier delivery resolved successfully
    CarrierJobCompleted {
        time: f64,
        contract_id: String,
        carrier_id: String,
        on_time: bool,
        quality: f64,
    },

    /// A carrier delivery failed
    CarrierJobFailed {
        time: f64,
        contract_id: String,
        carrier_id: String,
    },

    /// A carrier lost its lane assignment to a block
    CarrierDisrupted {
        time: f64,
        carrier_id: String,
        lane_id: String,
    },

    /// A world event started (effects already applied)
    EventTriggered {
        time: f64,
        event_id: String,
        kind: EventKind,
        name: String,
        severity: f64,
    },

    /// A world event was resolved by a player response
    EventResolved {
        time: f64,
        event_id: String,
        outcome: EventOutcome,
    },

    /// A world event expired without a response
    EventExpired {
        time: f64,
        event_id: String,
        outcome: EventOutcome,
    },

    /// Daily market re-evaluation ran
    MarketUpdated { time: f64, day: u64 },

    /// Player balance changed
    BalanceChanged {
        time: f64,
        delta: i64,
        balance: i64,
        reason: String,
    },

    /// Player reputation changed in some scope
    ReputationChanged {
        time: f64,
        scope: ReputationScope,
        value: f64,
    },

    /// Player reached a new level
    LevelUp { time: f64, level: u32 },

    /// Balance fell below the bankruptcy threshold
    Bankruptcy { time: f64, balance: i64 },
}

impl Notification {
    /// Game time the change occurred at.
    pub fn time(&self) -> f64 {
        match self {
            Notification::LaneStatusChanged { time, .. }
            | Notification::LaneConditionChanged { time, .. }
            | Notification::ContractOffered { time, .. }
            | Notification::ContractAccepted { time, .. }
            | Notification::ContractCompleted { time, .. }
            | Notification::ContractFailed { time, .. }
            | Notification::ContractExpired { time, .. }
            | Notification::CarrierOfferMade { time, .. }
            | Notification::CarrierJobAccepted { time, .. }
            | Notification::CarrierJobCompleted { time, .. }
            | Notification::CarrierJobFailed { time, .. }
            | Notification::CarrierDisrupted { time, .. }
            | Notification::EventTriggered { time, .. }
            | Notification::EventResolved { time, .. }
            | Notification::EventExpired { time, .. }
            | Notification::MarketUpdated { time, .. }
            | Notification::BalanceChanged { time, .. }
            | Notification::ReputationChanged { time, .. }
            | Notification::LevelUp { time, .. }
            | Notification::Bankruptcy { time, .. } => *time,
        }
    }
}

/// In-memory queue of notifications, drained once per tick by the
/// collaborator layer. The core never blocks on consumers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationLog {
    entries: Vec<Notification>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notification: Notification) {
        self.entries.push(notification);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Notification] {
        &self.entries
    }

    /// Remove and return all queued notifications.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.entries)
    }
}
