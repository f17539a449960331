//! Simulation root
//!
//! Owns every engine and the clock, and drives them in a fixed per-tick
//! order:
//!
//! ```text
//! For each tick:
//! 1. Advance the clock (collecting crossed day boundaries)
//! 2. Expiration sweeps (world events, pending contracts)
//! 3. Periodic schedulers (contract generation, delivery resolution,
//!    event spawning)
//! 4. Daily cascade, once per crossed day, in fixed order:
//!    Market → Map → Contracts → Carriers → Player
//! ```
//!
//! Cross-engine interactions resolve synchronously inside one tick — a
//! blocked lane is never observable with a live carrier assignment. All
//! engine references are passed explicitly per call; there is no global
//! lookup anywhere.
//!
//! # Determinism
//!
//! All randomness flows through one seeded [`RngManager`]. Same seed +
//! same config + same command sequence = identical run.

use crate::carriers::{CarrierEngine, CarrierEngineError, NegotiationResponse};
use crate::contracts::{ContractEngine, ContractEngineError};
use crate::core::time::GameClock;
use crate::map::{MapError, MapState};
use crate::market::MarketEngine;
use crate::models::carrier::Carrier;
use crate::models::contract::CarrierOffer;
use crate::models::customer::Customer;
use crate::models::lane::{Lane, LaneError, LaneUpgrade, RiskLevel};
use crate::models::notification::{Notification, NotificationLog};
use crate::models::region::{City, Region};
use crate::models::world_event::{EventOutcome, WorldEventError};
use crate::models::Commodity;
use crate::player::{LedgerError, PlayerLedger, ReputationScope};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

// ============================================================================
// Configuration Types
// ============================================================================

fn default_time_scale() -> f64 {
    1.0
}

fn default_starting_balance() -> i64 {
    50_000
}

fn default_lane_risk() -> RiskLevel {
    RiskLevel::Medium
}

/// Complete simulation configuration: the world as it exists at time zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// RNG seed for deterministic simulation
    pub rng_seed: u64,

    /// Multiplier from wall delta to simulated seconds
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,

    /// Player starting balance (whole currency units)
    #[serde(default = "default_starting_balance")]
    pub starting_balance: i64,

    pub commodities: Vec<CommoditySetup>,

    #[serde(default)]
    pub groups: Vec<GroupSetup>,

    pub regions: Vec<RegionSetup>,
    pub cities: Vec<CitySetup>,
    pub lanes: Vec<LaneSetup>,
    pub customers: Vec<CustomerSetup>,
    pub carriers: Vec<CarrierSetup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommoditySetup {
    pub id: String,
    pub name: String,
    pub category: String,
    pub base_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSetup {
    pub id: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionSetup {
    pub id: String,
    pub name: String,
    pub risk_factor: f64,
    pub economy_strength: f64,
    pub weather_susceptibility: f64,

    /// Parent pricing actor (e.g. "global_market"); None = standalone
    #[serde(default)]
    pub parent_market: Option<String>,

    /// Blending weight toward the region's own price, 0..1 (default 1.0)
    #[serde(default)]
    pub influence: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitySetup {
    pub id: String,
    pub name: String,
    pub region_id: String,
    pub position: (f64, f64),
    pub population: u64,
    pub infrastructure: f64,
    #[serde(default)]
    pub industries: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneSetup {
    pub id: String,
    pub start_city: String,
    pub end_city: String,
    pub distance: f64,
    #[serde(default)]
    pub congestion: f64,
    #[serde(default = "default_lane_risk")]
    pub risk: RiskLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerSetup {
    pub id: String,
    pub name: String,
    pub trust: f64,
    /// Cargo type → demand weight
    pub needs: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierSetup {
    pub id: String,
    pub name: String,
    pub reputation: f64,
    pub fleet_size: u32,
    pub speed_factor: f64,
    pub risk_tolerance: f64,
    pub pricing_factor: f64,
    #[serde(default)]
    pub preferred_cargo: Vec<String>,
}

// ============================================================================
// Errors and results
// ============================================================================

/// Simulation lifecycle errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("State validation error: {0}")]
    StateValidationError(String),

    #[error("Checkpoint config hash does not match the supplied config")]
    ConfigMismatch,
}

/// Command failures. Expected-failure paths (insufficient funds, business
/// rejections) come back as variants here, never as panics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error("Unknown carrier: {0}")]
    UnknownCarrier(String),

    #[error("Carrier is blacklisted: {0}")]
    CarrierBlacklisted(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Contracts(#[from] ContractEngineError),

    #[error(transparent)]
    Carriers(#[from] CarrierEngineError),

    #[error(transparent)]
    Events(#[from] WorldEventError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Result of one tick.
#[derive(Debug, Clone)]
pub struct TickResult {
    /// Simulated time after the tick
    pub time: f64,
    /// Day boundaries crossed by this tick, in order
    pub days_crossed: Vec<u64>,
    /// Pending contracts expired by the sweep
    pub contracts_expired: usize,
    /// World events expired by the sweep
    pub events_expired: usize,
    /// Carrier deliveries resolved this tick
    pub deliveries_resolved: usize,
    /// One report per crossed day
    pub day_reports: Vec<DayReport>,
}

/// Summary of one daily cascade pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DayReport {
    pub day: u64,
    /// Lane maintenance charged across the owned network
    pub maintenance_charged: i64,
    /// Loan principal+interest paid today
    pub loan_payments: i64,
    /// Net worth after the cascade
    pub net_worth: i64,
}

// ============================================================================
// Simulation
// ============================================================================

/// The simulation root owning all engines.
pub struct Simulation {
    config: SimulationConfig,
    clock: GameClock,
    rng: RngManager,
    market: MarketEngine,
    map: MapState,
    contracts: ContractEngine,
    carriers: CarrierEngine,
    events: crate::events::EventEngine,
    ledger: PlayerLedger,
    notifications: NotificationLog,
    debug_mode: bool,
}

impl Simulation {
    /// Build a simulation from a validated configuration.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        Self::validate_config(&config)?;

        let mut rng = RngManager::new(config.rng_seed);

        // Market
        let mut market = MarketEngine::new();
        for c in &config.commodities {
            market.add_commodity(Commodity::new(&c.id, &c.name, &c.category, c.base_price));
        }
        for g in &config.groups {
            market.add_group(&g.id);
            for member in &g.members {
                market
                    .add_commodity_to_group(member, &g.id)
                    .map_err(|e| SimulationError::InvalidConfig(e.to_string()))?;
            }
        }
        let region_ids: HashSet<&str> = config.regions.iter().map(|r| r.id.as_str()).collect();
        for r in &config.regions {
            if let Some(parent) = &r.parent_market {
                // Abstract parents ("global_market") get a standalone actor
                if !region_ids.contains(parent.as_str()) {
                    market.add_actor(parent, None, None);
                }
            }
            market.add_actor(&r.id, r.parent_market.as_deref(), r.influence);
        }

        // Map
        let mut map = MapState::new();
        for r in &config.regions {
            map.add_region(Region::new(
                &r.id,
                &r.name,
                r.risk_factor,
                r.economy_strength,
                r.weather_susceptibility,
            ));
        }
        for c in &config.cities {
            let region_risk = config
                .regions
                .iter()
                .find(|r| r.id == c.region_id)
                .map(|r| r.risk_factor)
                .unwrap_or(0.0);
            map.add_city(City::new(
                &c.id,
                &c.name,
                &c.region_id,
                c.position,
                c.population,
                c.infrastructure,
                c.industries.iter().cloned().collect(),
                region_risk,
            ))
            .map_err(|e| SimulationError::InvalidConfig(e.to_string()))?;
        }
        for l in &config.lanes {
            map.add_lane(Lane::new(
                &l.id,
                &l.start_city,
                &l.end_city,
                l.distance,
                l.congestion,
                l.risk,
            ));
        }

        // Customers
        let mut contracts = ContractEngine::new();
        for c in &config.customers {
            let mut customer = Customer::new(&c.id, &c.name, c.trust);
            for (cargo, weight) in &c.needs {
                customer.set_need(cargo, *weight);
            }
            contracts.add_customer(customer);
        }

        // Carriers (style draws consume the shared stream in config order)
        let mut carriers = CarrierEngine::new(config.rng_seed);
        for c in &config.carriers {
            carriers.add_carrier(Carrier::new(
                &c.id,
                &c.name,
                c.reputation,
                c.fleet_size,
                c.speed_factor,
                c.risk_tolerance,
                c.pricing_factor,
                c.preferred_cargo.iter().cloned().collect(),
                &mut rng,
            ));
        }

        let clock = GameClock::new(config.time_scale);
        let ledger = PlayerLedger::new(config.starting_balance);

        Ok(Self {
            config,
            clock,
            rng,
            market,
            map,
            contracts,
            carriers,
            events: crate::events::EventEngine::new(),
            ledger,
            notifications: NotificationLog::new(),
            debug_mode: false,
        })
    }

    /// Validate configuration before building anything.
    fn validate_config(config: &SimulationConfig) -> Result<(), SimulationError> {
        if config.time_scale <= 0.0 {
            return Err(SimulationError::InvalidConfig(
                "time_scale must be > 0".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut check_unique = |kind: &str, id: &str| -> Result<(), SimulationError> {
            if !seen.insert(format!("{kind}:{id}")) {
                return Err(SimulationError::InvalidConfig(format!(
                    "Duplicate {kind} id: {id}"
                )));
            }
            Ok(())
        };

        for c in &config.commodities {
            check_unique("commodity", &c.id)?;
        }
        for r in &config.regions {
            check_unique("region", &r.id)?;
        }
        for c in &config.cities {
            check_unique("city", &c.id)?;
        }
        for l in &config.lanes {
            check_unique("lane", &l.id)?;
        }
        for c in &config.customers {
            check_unique("customer", &c.id)?;
        }
        for c in &config.carriers {
            check_unique("carrier", &c.id)?;
        }

        let commodity_ids: HashSet<&str> =
            config.commodities.iter().map(|c| c.id.as_str()).collect();
        let region_ids: HashSet<&str> = config.regions.iter().map(|r| r.id.as_str()).collect();
        let city_ids: HashSet<&str> = config.cities.iter().map(|c| c.id.as_str()).collect();

        for g in &config.groups {
            for member in &g.members {
                if !commodity_ids.contains(member.as_str()) {
                    return Err(SimulationError::InvalidConfig(format!(
                        "Group {} references unknown commodity {member}",
                        g.id
                    )));
                }
            }
        }
        for c in &config.cities {
            if !region_ids.contains(c.region_id.as_str()) {
                return Err(SimulationError::InvalidConfig(format!(
                    "City {} references unknown region {}",
                    c.id, c.region_id
                )));
            }
        }
        for l in &config.lanes {
            for city in [&l.start_city, &l.end_city] {
                if !city_ids.contains(city.as_str()) {
                    return Err(SimulationError::InvalidConfig(format!(
                        "Lane {} references unknown city {city}",
                        l.id
                    )));
                }
            }
        }
        for c in &config.customers {
            for cargo in c.needs.keys() {
                if !commodity_ids.contains(cargo.as_str()) {
                    return Err(SimulationError::InvalidConfig(format!(
                        "Customer {} needs unknown commodity {cargo}",
                        c.id
                    )));
                }
            }
        }
        for c in &config.carriers {
            for cargo in &c.preferred_cargo {
                if !commodity_ids.contains(cargo.as_str()) {
                    return Err(SimulationError::InvalidConfig(format!(
                        "Carrier {} prefers unknown commodity {cargo}",
                        c.id
                    )));
                }
            }
        }

        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn current_time(&self) -> f64 {
        self.clock.current_time()
    }

    pub fn current_day(&self) -> u64 {
        self.clock.current_day()
    }

    pub fn market(&self) -> &MarketEngine {
        &self.market
    }

    pub fn map(&self) -> &MapState {
        &self.map
    }

    pub fn contracts(&self) -> &ContractEngine {
        &self.contracts
    }

    pub fn carriers(&self) -> &CarrierEngine {
        &self.carriers
    }

    pub fn events(&self) -> &crate::events::EventEngine {
        &self.events
    }

    pub fn ledger(&self) -> &PlayerLedger {
        &self.ledger
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    /// Mutable map access, primarily for tests. Direct mutation bypasses
    /// command-level invariants; use the command API in real flows.
    pub fn map_mut(&mut self) -> &mut MapState {
        &mut self.map
    }

    /// Mutable market access, primarily for tests.
    pub fn market_mut(&mut self) -> &mut MarketEngine {
        &mut self.market
    }

    /// Mutable contract engine access, primarily for tests.
    pub fn contracts_mut(&mut self) -> &mut ContractEngine {
        &mut self.contracts
    }

    /// Mutable carrier engine access, primarily for tests.
    pub fn carriers_mut(&mut self) -> &mut CarrierEngine {
        &mut self.carriers
    }

    /// Pending notifications, drained by the collaborator layer.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain()
    }

    pub fn pending_notifications(&self) -> usize {
        self.notifications.len()
    }

    // ========================================================================
    // Tick loop
    // ========================================================================

    /// Advance the simulation by `delta` (pre-scale) seconds.
    pub fn tick(&mut self, delta: f64) -> TickResult {
        // STEP 1: ADVANCE TIME
        let days_crossed = self.clock.advance(delta);
        let now = self.clock.current_time();

        // STEP 2: EXPIRATION SWEEPS
        let events_expired = self
            .events
            .sweep_expired(
                now,
                &mut self.market,
                &mut self.map,
                &mut self.carriers,
                &mut self.contracts,
                &mut self.notifications,
            )
            .len();
        let contracts_expired = self.contracts.sweep_expired(now, &mut self.notifications).len();

        // STEP 3: PERIODIC SCHEDULERS
        self.contracts
            .process_tick(now, &self.market, &mut self.rng, &mut self.notifications);
        let resolutions = self
            .carriers
            .process_tick(now, &mut self.rng, &mut self.notifications);
        self.events.process_tick(
            now,
            &mut self.rng,
            &mut self.market,
            &mut self.map,
            &mut self.carriers,
            &mut self.contracts,
            &mut self.notifications,
        );

        // STEP 4: DAILY CASCADE (once per crossed day)
        let mut day_reports = Vec::with_capacity(days_crossed.len());
        for day in &days_crossed {
            day_reports.push(self.run_daily_cascade(*day, now));
        }

        TickResult {
            time: now,
            days_crossed,
            contracts_expired,
            events_expired,
            deliveries_resolved: resolutions.len(),
            day_reports,
        }
    }

    /// One daily cascade pass in the fixed order
    /// Market → Map → Contracts → Carriers → Player, so recurring charges
    /// see the day's final price and lane state.
    fn run_daily_cascade(&mut self, day: u64, now: f64) -> DayReport {
        self.market.process_daily_update(now, &mut self.rng);
        self.notifications.push(Notification::MarketUpdated { time: now, day });

        self.map.process_daily_update(now, &mut self.rng, &mut self.notifications);
        self.contracts.process_daily_update(now);
        self.carriers.process_daily_update(now);

        let maintenance = self.map.total_maintenance();
        if maintenance > 0 {
            self.ledger.adjust_balance(
                -maintenance,
                "lane maintenance",
                now,
                &mut self.notifications,
            );
        }

        let debt_before = self.ledger.total_debt();
        self.ledger.process_daily_update(now, &mut self.notifications);
        let loan_payments = debt_before - self.ledger.total_debt();

        let net_worth = self
            .ledger
            .recompute_net_worth(self.map.asset_value(), self.contracts.expected_profit());

        DayReport {
            day,
            maintenance_charged: maintenance,
            loan_payments,
            net_worth,
        }
    }

    // ========================================================================
    // Commands (collaborator → core)
    // ========================================================================

    fn ensure_funds(&self, required: i64) -> Result<(), CommandError> {
        if !self.ledger.can_afford(required) {
            return Err(CommandError::InsufficientFunds {
                required,
                available: self.ledger.balance(),
            });
        }
        Ok(())
    }

    fn push_lane_status(&mut self, lane_id: &str) {
        if let Some(lane) = self.map.lane(lane_id) {
            let status = lane.status();
            self.notifications.push(Notification::LaneStatusChanged {
                time: self.clock.current_time(),
                lane_id: lane_id.to_string(),
                status,
            });
        }
    }

    /// Purchase an available lane. Returns the cost charged.
    pub fn purchase_lane(&mut self, lane_id: &str) -> Result<i64, CommandError> {
        let lane = self
            .map
            .lane(lane_id)
            .ok_or_else(|| MapError::UnknownLane(lane_id.to_string()))?;
        if lane.is_owned() {
            return Err(MapError::Lane(LaneError::NotAvailable).into());
        }
        if lane.is_blocked() {
            return Err(MapError::Lane(LaneError::Blocked).into());
        }

        let cost = lane.base_cost();
        self.ensure_funds(cost)?;

        self.map.purchase_lane(lane_id)?;
        let now = self.clock.current_time();
        self.ledger.adjust_balance(
            -cost,
            &format!("lane purchase {lane_id}"),
            now,
            &mut self.notifications,
        );
        self.push_lane_status(lane_id);
        Ok(cost)
    }

    /// Sell an owned, unassigned lane. Returns the proceeds credited.
    pub fn sell_lane(&mut self, lane_id: &str) -> Result<i64, CommandError> {
        let proceeds = self.map.sell_lane(lane_id)?;
        let now = self.clock.current_time();
        self.ledger.adjust_balance(
            proceeds,
            &format!("lane sale {lane_id}"),
            now,
            &mut self.notifications,
        );
        self.push_lane_status(lane_id);
        Ok(proceeds)
    }

    /// Assign a carrier to an owned lane.
    pub fn assign_carrier(&mut self, lane_id: &str, carrier_id: &str) -> Result<(), CommandError> {
        let carrier = self
            .carriers
            .carrier(carrier_id)
            .ok_or_else(|| CommandError::UnknownCarrier(carrier_id.to_string()))?;
        if carrier.is_blacklisted() {
            return Err(CommandError::CarrierBlacklisted(carrier_id.to_string()));
        }

        self.map.assign_carrier(lane_id, carrier_id)?;
        self.push_lane_status(lane_id);
        Ok(())
    }

    /// Clear a lane's carrier assignment. Returns the carrier id.
    pub fn unassign_carrier(&mut self, lane_id: &str) -> Result<String, CommandError> {
        let carrier_id = self.map.unassign_carrier(lane_id)?;
        self.push_lane_status(lane_id);
        Ok(carrier_id)
    }

    /// Apply a one-shot upgrade to an owned lane. Returns the cost charged.
    pub fn upgrade_lane(&mut self, lane_id: &str, upgrade: LaneUpgrade) -> Result<i64, CommandError> {
        let lane = self
            .map
            .lane(lane_id)
            .ok_or_else(|| MapError::UnknownLane(lane_id.to_string()))?;
        if !lane.is_owned() {
            return Err(MapError::Lane(LaneError::NotOwned).into());
        }

        // Funds check before the (irreversible) upgrade application
        let cost = (lane.base_cost() as f64 * upgrade.cost_factor()).round() as i64;
        self.ensure_funds(cost)?;

        let charged = self.map.apply_lane_upgrade(lane_id, upgrade)?;
        debug_assert_eq!(charged, cost);

        let now = self.clock.current_time();
        self.ledger.adjust_balance(
            -charged,
            &format!("lane upgrade {lane_id}"),
            now,
            &mut self.notifications,
        );

        if let Some(lane) = self.map.lane(lane_id) {
            let (congestion, risk) = (lane.congestion(), lane.risk());
            self.notifications.push(Notification::LaneConditionChanged {
                time: now,
                lane_id: lane_id.to_string(),
                congestion,
                risk,
            });
        }
        Ok(charged)
    }

    /// Accept a pending customer contract, paying the upfront cost.
    pub fn accept_contract(&mut self, contract_id: &str) -> Result<(), CommandError> {
        let contract = self
            .contracts
            .contract(contract_id)
            .ok_or_else(|| ContractEngineError::UnknownContract(contract_id.to_string()))?;
        let upfront = contract.upfront_cost();
        self.ensure_funds(upfront)?;

        let now = self.clock.current_time();
        let outcome = self
            .contracts
            .accept_contract(contract_id, now, &mut self.notifications)?;

        self.ledger.adjust_balance(
            -outcome.upfront_cost,
            &format!("contract upfront {contract_id}"),
            now,
            &mut self.notifications,
        );
        Ok(())
    }

    /// Decline a pending contract without waiting for it to expire.
    pub fn decline_contract(&mut self, contract_id: &str) -> Result<(), CommandError> {
        let now = self.clock.current_time();
        self.contracts
            .decline_contract(contract_id, now, &mut self.notifications)?;
        Ok(())
    }

    /// Report fulfillment of an active customer contract. Credits the
    /// payout and awards XP on success; charges the penalty on failure.
    pub fn fulfill_contract(&mut self, contract_id: &str, success: bool) -> Result<(), CommandError> {
        let now = self.clock.current_time();
        let outcome = self
            .contracts
            .complete_contract(contract_id, success, now, &mut self.notifications)?;

        if outcome.success {
            self.ledger.adjust_balance(
                outcome.payout,
                &format!("contract payout {contract_id}"),
                now,
                &mut self.notifications,
            );
            self.ledger
                .award_experience(outcome.experience, now, &mut self.notifications);
            self.ledger.adjust_reputation(
                ReputationScope::Customer,
                1.0,
                now,
                &mut self.notifications,
            );
        } else {
            self.ledger.adjust_balance(
                -outcome.penalty,
                &format!("contract penalty {contract_id}"),
                now,
                &mut self.notifications,
            );
            self.ledger.adjust_reputation(
                ReputationScope::Customer,
                -2.0,
                now,
                &mut self.notifications,
            );
        }
        Ok(())
    }

    /// Request a carrier quote for a job on an owned lane.
    pub fn request_carrier_offer(
        &mut self,
        lane_id: &str,
        cargo_type: &str,
        amount: u32,
        deadline: f64,
    ) -> Result<CarrierOffer, CommandError> {
        let lane = self
            .map
            .lane(lane_id)
            .ok_or_else(|| MapError::UnknownLane(lane_id.to_string()))?;
        if !lane.is_owned() {
            return Err(MapError::Lane(LaneError::NotOwned).into());
        }
        if lane.is_blocked() {
            return Err(MapError::Lane(LaneError::Blocked).into());
        }

        let now = self.clock.current_time();
        let offer = self.carriers.generate_offer(
            lane,
            cargo_type,
            amount,
            deadline,
            &self.market,
            now,
            &mut self.rng,
            &mut self.notifications,
        )?;
        Ok(offer)
    }

    /// Accept a carrier offer, paying the quoted price.
    pub fn accept_carrier_offer(&mut self, offer: &CarrierOffer) -> Result<String, CommandError> {
        self.ensure_funds(offer.price)?;

        let now = self.clock.current_time();
        let contract_id = self
            .carriers
            .accept_offer(offer, now, &mut self.notifications)?;

        self.ledger.adjust_balance(
            -offer.price,
            &format!("carrier job {contract_id}"),
            now,
            &mut self.notifications,
        );
        Ok(contract_id)
    }

    /// Counter a carrier offer. The carrier's reply depends on its
    /// negotiation style and the player's global reputation.
    pub fn negotiate_offer(
        &self,
        offer: &CarrierOffer,
        counter_price: i64,
    ) -> Result<NegotiationResponse, CommandError> {
        let response = self.carriers.negotiate_offer(
            offer,
            counter_price,
            self.ledger.reputation().global,
            self.clock.current_time(),
        )?;
        Ok(response)
    }

    /// Respond to an active world event.
    pub fn resolve_event(&mut self, event_id: &str, response: &str) -> Result<EventOutcome, CommandError> {
        let now = self.clock.current_time();
        let outcome = self.events.resolve_event(
            event_id,
            response,
            now,
            &mut self.market,
            &mut self.map,
            &mut self.carriers,
            &mut self.contracts,
            &mut self.notifications,
        )?;
        Ok(outcome)
    }

    /// Take a loan; the principal is credited immediately.
    pub fn take_loan(&mut self, principal: i64, rate: f64, term_days: u32) -> Result<String, CommandError> {
        let now = self.clock.current_time();
        let loan_id = self
            .ledger
            .take_loan(principal, rate, term_days, now, &mut self.notifications)?;
        Ok(loan_id)
    }

    /// Toggle debug mode (extra diagnostics in the collaborator layer).
    pub fn set_debug_mode(&mut self, enabled: bool) {
        self.debug_mode = enabled;
    }

    /// Change the clock's time scale.
    pub fn set_time_scale(&mut self, scale: f64) -> Result<(), CommandError> {
        if scale <= 0.0 {
            return Err(CommandError::InvalidArgument(
                "time_scale must be > 0".to_string(),
            ));
        }
        self.clock.set_time_scale(scale);
        Ok(())
    }

    // ========================================================================
    // Checkpoint plumbing (snapshot shapes live in `checkpoint`)
    // ========================================================================

    pub(crate) fn checkpoint_parts(
        &self,
    ) -> (
        &GameClock,
        &RngManager,
        &MarketEngine,
        &MapState,
        &ContractEngine,
        &CarrierEngine,
        &crate::events::EventEngine,
        &PlayerLedger,
    ) {
        (
            &self.clock,
            &self.rng,
            &self.market,
            &self.map,
            &self.contracts,
            &self.carriers,
            &self.events,
            &self.ledger,
        )
    }

    pub(crate) fn from_checkpoint_parts(
        config: SimulationConfig,
        clock: GameClock,
        rng: RngManager,
        market: MarketEngine,
        map: MapState,
        contracts: ContractEngine,
        carriers: CarrierEngine,
        events: crate::events::EventEngine,
        ledger: PlayerLedger,
    ) -> Self {
        Self {
            config,
            clock,
            rng,
            market,
            map,
            contracts,
            carriers,
            events,
            ledger,
            notifications: NotificationLog::new(),
            debug_mode: false,
        }
    }
}
