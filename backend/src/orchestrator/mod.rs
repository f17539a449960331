//! Simulation orchestration
//!
//! - **engine**: the [`Simulation`] root — config validation, the per-tick
//!   pipeline (sweeps → schedulers → daily cascade), and the command API
//! - **checkpoint**: whole-simulation snapshot/restore with config hashing

mod checkpoint;
mod engine;

pub use checkpoint::{compute_config_hash, validate_snapshot, SimulationSnapshot};
pub use engine::{
    CarrierSetup, CitySetup, CommandError, CommoditySetup, CustomerSetup, DayReport, GroupSetup,
    LaneSetup, RegionSetup, Simulation, SimulationConfig, SimulationError, TickResult,
};
