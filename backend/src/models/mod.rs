//! Domain models for the freight simulation.
//!
//! Lifecycle entities (lanes, customers, carriers, contracts, world events)
//! keep their fields private and expose mutators that enforce the entity's
//! invariants. Plain value/config records use public fields.

pub mod carrier;
pub mod commodity;
pub mod contract;
pub mod customer;
pub mod lane;
pub mod notification;
pub mod region;
pub mod world_event;

pub use carrier::{Carrier, CarrierError, CarrierHistory, DeliveryRecord, NegotiationStyle};
pub use commodity::Commodity;
pub use contract::{
    CarrierContract, CarrierContractStatus, CarrierOffer, ContractError, ContractStatus,
    CustomerContract,
};
pub use customer::{Customer, CustomerError, CustomerTier};
pub use lane::{Lane, LaneError, LaneStatus, LaneUpgrade, RiskLevel, TempEffect};
pub use notification::{Notification, NotificationLog};
pub use region::{City, Region};
pub use world_event::{AppliedEffect, EventKind, EventOutcome, WorldEvent, WorldEventError};

use serde::{Deserialize, Serialize};

/// Typed reference to an entity affected by a world event.
///
/// Replaces string-prefix conventions ("item_", "lane_" …) with a tagged
/// union so dispatch on the entity kind is explicit and collision-free.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    Commodity(String),
    Lane(String),
    Carrier(String),
    Customer(String),
    Contract(String),
}

impl EntityRef {
    /// The referenced entity's id, without the kind tag.
    pub fn id(&self) -> &str {
        match self {
            EntityRef::Commodity(id)
            | EntityRef::Lane(id)
            | EntityRef::Carrier(id)
            | EntityRef::Customer(id)
            | EntityRef::Contract(id) => id,
        }
    }
}
