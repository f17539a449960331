//! Freight Simulator Core - Rust Engine
//!
//! Deterministic logistics/trade simulation engine: a commodity market with
//! a stacking price-modifier system, a city/lane network with drifting
//! conditions, customer and carrier contract lifecycles with negotiation,
//! random world events with reversible effects, and a player ledger — all
//! driven by one game-time clock with per-tick and daily cadences.
//!
//! # Architecture
//!
//! - **core**: game-time management (continuous clock, day boundaries)
//! - **models**: domain types (commodities, lanes, customers, carriers,
//!   contracts, world events, notifications)
//! - **market**: price engine (modifier stack, drift, daily dynamics)
//! - **map**: lane network state and daily condition drift
//! - **contracts**: customer contract generation and lifecycle
//! - **carriers**: carrier roster, offers, negotiation, deliveries
//! - **events**: world events with snapshot-and-restore effects
//! - **player**: balance, reputation, leveling, loans
//! - **orchestrator**: the simulation root, tick pipeline, checkpointing
//! - **rng**: deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. All money values are i64 (whole currency units)
//! 2. All randomness is deterministic (seeded RNG, entity-scoped forks)
//! 3. Cross-engine interactions resolve synchronously within one tick

// Module declarations
pub mod carriers;
pub mod contracts;
pub mod core;
pub mod events;
pub mod map;
pub mod market;
pub mod models;
pub mod orchestrator;
pub mod player;
pub mod rng;

// Re-exports for convenience
pub use carriers::{CarrierEngine, CarrierEngineError, NegotiationResponse};
pub use contracts::{ContractEngine, ContractEngineError};
pub use crate::core::time::{GameClock, SECONDS_PER_DAY};
pub use map::{MapError, MapState};
pub use market::{
    DriftComponent, MarketEngine, MarketError, ModifierKind, ModifierScope, ModifierStacking,
    ModifierTarget, PriceModifier,
};
pub use models::{
    Carrier, CarrierContract, CarrierContractStatus, CarrierOffer, City, Commodity,
    ContractStatus, Customer, CustomerContract, CustomerTier, EntityRef, EventKind, EventOutcome,
    Lane, LaneStatus, LaneUpgrade, NegotiationStyle, Notification, NotificationLog, Region,
    RiskLevel, WorldEvent,
};
pub use orchestrator::{
    compute_config_hash, validate_snapshot, CarrierSetup, CitySetup, CommandError, CommoditySetup,
    CustomerSetup, DayReport, GroupSetup, LaneSetup, RegionSetup, Simulation, SimulationConfig,
    SimulationError, SimulationSnapshot, TickResult,
};
pub use player::{PlayerLedger, ReputationScope};
pub use rng::RngManager;
pub use events::EventEngine;
