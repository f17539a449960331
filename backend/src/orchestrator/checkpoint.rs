//! Checkpoint - Save/Load Simulation State
//!
//! Serializes the complete simulation (clock, RNG state, every engine) so a
//! run can pause and resume with identical behavior.
//!
//! # Critical Invariants
//!
//! - **Determinism**: restoring a checkpoint and continuing produces the
//!   same run as never having paused (RNG state is stored verbatim)
//! - **Config matching**: a snapshot can only be loaded against the config
//!   it was taken with (canonical-JSON SHA256 hash)
//! - **Referential integrity**: contracts reference existing customers,
//!   carriers, and lanes; no blocked lane carries an assignment
//! - **Derived-state reset**: caches (connection lookup) start empty and
//!   derived market modifiers are regenerated, never deserialized

use crate::carriers::{CarrierEngine, CarrierEngineSnapshot};
use crate::contracts::{ContractEngine, ContractEngineSnapshot};
use crate::core::time::GameClock;
use crate::events::{EventEngine, EventEngineSnapshot};
use crate::map::{MapSnapshot, MapState};
use crate::market::{MarketEngine, MarketSnapshot};
use crate::models::contract::{CarrierContractStatus, ContractStatus};
use crate::models::lane::LaneStatus;
use crate::orchestrator::engine::{Simulation, SimulationConfig, SimulationError};
use crate::player::{PlayerLedger, PlayerSnapshot};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};

// ============================================================================
// Snapshot Structure
// ============================================================================

/// Complete simulation state snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    /// Simulated seconds elapsed
    pub time: f64,
    pub time_scale: f64,
    /// Last day boundary already reported by the clock
    pub last_reported_day: u64,

    /// RNG state at snapshot time (CRITICAL for determinism)
    pub rng_state: u64,

    pub market: MarketSnapshot,
    pub map: MapSnapshot,
    pub contracts: ContractEngineSnapshot,
    pub carriers: CarrierEngineSnapshot,
    pub events: EventEngineSnapshot,
    pub player: PlayerSnapshot,

    /// SHA256 hash of the originating config (for validation)
    pub config_hash: String,
}

// ============================================================================
// Config Hashing
// ============================================================================

/// Compute a deterministic SHA256 hash of a config.
///
/// Uses canonical JSON with recursively sorted object keys so the hash is
/// independent of map iteration order.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, SimulationError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    let value = serde_json::to_value(config).map_err(|e| {
        SimulationError::SerializationError(format!("Config serialization failed: {}", e))
    })?;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let canonical = canonicalize(value);
    let json = serde_json::to_string(&canonical).map_err(|e| {
        SimulationError::SerializationError(format!("Config serialization failed: {}", e))
    })?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// Validation
// ============================================================================

/// Validate snapshot integrity before restoring.
pub fn validate_snapshot(snapshot: &SimulationSnapshot) -> Result<(), SimulationError> {
    // Entity id indexes
    let customer_ids: HashSet<&str> = snapshot
        .contracts
        .customers
        .iter()
        .map(|c| c.id())
        .collect();
    let carrier_ids: HashSet<&str> = snapshot.carriers.carriers.iter().map(|c| c.id()).collect();
    let lane_ids: HashSet<&str> = snapshot.map.lanes.iter().map(|l| l.id()).collect();

    // 1. Customer contracts reference known customers, and each contract id
    //    is unique (a contract can never sit in two status buckets)
    let mut contract_status: HashMap<&str, ContractStatus> = HashMap::new();
    for contract in &snapshot.contracts.contracts {
        if !customer_ids.contains(contract.customer_id.as_str()) {
            return Err(SimulationError::StateValidationError(format!(
                "Contract {} references unknown customer {}",
                contract.id, contract.customer_id
            )));
        }
        if contract_status.insert(&contract.id, contract.status).is_some() {
            return Err(SimulationError::StateValidationError(format!(
                "Duplicate contract id: {}",
                contract.id
            )));
        }
    }

    // 2. Customers' active lists point at Active contracts owned by them
    for customer in &snapshot.contracts.customers {
        for contract_id in customer.active_contracts() {
            match contract_status.get(contract_id.as_str()) {
                Some(ContractStatus::Active) => {}
                Some(status) => {
                    return Err(SimulationError::StateValidationError(format!(
                        "Customer {} lists contract {} as active but its status is {:?}",
                        customer.id(),
                        contract_id,
                        status
                    )));
                }
                None => {
                    return Err(SimulationError::StateValidationError(format!(
                        "Customer {} lists unknown contract {}",
                        customer.id(),
                        contract_id
                    )));
                }
            }
        }
    }

    // 3. Carrier contracts reference known carriers
    let mut carrier_contract_status: HashMap<&str, CarrierContractStatus> = HashMap::new();
    for contract in &snapshot.carriers.contracts {
        if !carrier_ids.contains(contract.carrier_id.as_str()) {
            return Err(SimulationError::StateValidationError(format!(
                "Carrier contract {} references unknown carrier {}",
                contract.id, contract.carrier_id
            )));
        }
        carrier_contract_status.insert(&contract.id, contract.status);
    }
    for carrier in &snapshot.carriers.carriers {
        for contract_id in carrier.active_contracts() {
            match carrier_contract_status.get(contract_id.as_str()) {
                Some(CarrierContractStatus::Active) => {}
                other => {
                    return Err(SimulationError::StateValidationError(format!(
                        "Carrier {} lists contract {} as active but found {:?}",
                        carrier.id(),
                        contract_id,
                        other
                    )));
                }
            }
        }
    }

    // 4. Lane assignments: known carriers only, never on a blocked lane
    for lane in &snapshot.map.lanes {
        if let Some(carrier_id) = lane.assigned_carrier() {
            if lane.status() == LaneStatus::Blocked {
                return Err(SimulationError::StateValidationError(format!(
                    "Blocked lane {} still carries assignment {}",
                    lane.id(),
                    carrier_id
                )));
            }
            if !carrier_ids.contains(carrier_id) {
                return Err(SimulationError::StateValidationError(format!(
                    "Lane {} assigned to unknown carrier {}",
                    lane.id(),
                    carrier_id
                )));
            }
        }
    }

    // 5. Carrier contracts reference known lanes
    for contract in &snapshot.carriers.contracts {
        if !lane_ids.contains(contract.lane_id.as_str()) {
            return Err(SimulationError::StateValidationError(format!(
                "Carrier contract {} references unknown lane {}",
                contract.id, contract.lane_id
            )));
        }
    }

    Ok(())
}

// ============================================================================
// Simulation integration
// ============================================================================

impl Simulation {
    /// Capture the complete simulation state.
    pub fn to_snapshot(&self) -> Result<SimulationSnapshot, SimulationError> {
        let (clock, rng, market, map, contracts, carriers, events, ledger) =
            self.checkpoint_parts();

        Ok(SimulationSnapshot {
            time: clock.current_time(),
            time_scale: clock.time_scale(),
            last_reported_day: clock.last_reported_day(),
            rng_state: rng.get_state(),
            market: market.to_snapshot(),
            map: map.to_snapshot(),
            contracts: contracts.to_snapshot(),
            carriers: carriers.to_snapshot(),
            events: events.to_snapshot(),
            player: ledger.to_snapshot(),
            config_hash: compute_config_hash(self.config())?,
        })
    }

    /// Restore a simulation from a snapshot taken with `config`.
    ///
    /// The config hash must match; the snapshot is integrity-validated; and
    /// derived state (connection cache, derived market modifiers) is rebuilt
    /// rather than deserialized.
    pub fn from_snapshot(
        config: SimulationConfig,
        snapshot: SimulationSnapshot,
    ) -> Result<Self, SimulationError> {
        if compute_config_hash(&config)? != snapshot.config_hash {
            return Err(SimulationError::ConfigMismatch);
        }
        validate_snapshot(&snapshot)?;

        let clock = GameClock::from_snapshot(
            snapshot.time,
            snapshot.time_scale,
            snapshot.last_reported_day,
        );
        let rng = RngManager::new(snapshot.rng_state);

        Ok(Simulation::from_checkpoint_parts(
            config,
            clock,
            rng,
            MarketEngine::from_snapshot(snapshot.market),
            MapState::from_snapshot(snapshot.map),
            ContractEngine::from_snapshot(snapshot.contracts),
            CarrierEngine::from_snapshot(snapshot.carriers),
            EventEngine::from_snapshot(snapshot.events),
            PlayerLedger::from_snapshot(snapshot.player),
        ))
    }
}
