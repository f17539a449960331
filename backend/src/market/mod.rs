//! Commodity market engine
//!
//! Produces a price for (commodity, time, region) from a base price, summed
//! drift curves, and a two-phase modifier stack (BASE, then TOTAL), with
//! optional regional actors blending a region's price toward a parent
//! market. A daily re-evaluation random-walks per-commodity trend, demand
//! and supply factors, re-derives the reserved dynamic modifiers from them,
//! and appends to a fixed-length price history per commodity.
//!
//! # Determinism
//!
//! All collections are ordered (`BTreeMap`) so iteration — and therefore
//! RNG consumption during the daily walk — is identical across runs.

mod drift;
mod modifier;

pub use drift::{drift_sum, DriftComponent};
pub use modifier::{
    fold_phase, ModifierKind, ModifierScope, ModifierStacking, ModifierTarget, PriceModifier,
};

use crate::models::Commodity;
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use thiserror::Error;

/// Entries kept in each commodity's daily price history.
pub const PRICE_HISTORY_LEN: usize = 30;

/// Prefixes of modifiers the engine derives itself each day. These are
/// excluded from snapshots and regenerated on restore.
const DERIVED_PREFIXES: [&str; 3] = ["demand:", "supply:", "trend:"];

/// Market operation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarketError {
    #[error("Unknown commodity: {0}")]
    UnknownCommodity(String),

    #[error("Unknown commodity group: {0}")]
    UnknownGroup(String),
}

/// A pricing actor: a region (or abstract market) that can inherit from a
/// parent with a damping influence factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketActor {
    pub id: String,
    pub parent: Option<String>,
    /// Weight of the actor's own price vs. the parent's, 0..1.
    /// 1.0 = fully region-specific (parent ignored).
    pub influence: f64,
}

/// Per-commodity daily dynamics, random-walked once per day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommodityDynamics {
    /// Directional drift, -0.2..0.2
    pub trend: f64,
    /// Demand factor, 0.5..1.5 (higher ⇒ price up)
    pub demand: f64,
    /// Supply factor, 0.5..1.5 (higher ⇒ price down, via inverse)
    pub supply: f64,
}

impl Default for CommodityDynamics {
    fn default() -> Self {
        Self {
            trend: 0.0,
            demand: 1.0,
            supply: 1.0,
        }
    }
}

/// The commodity market.
#[derive(Debug, Clone, Default)]
pub struct MarketEngine {
    commodities: BTreeMap<String, Commodity>,
    /// Group id → member commodity ids
    groups: BTreeMap<String, BTreeSet<String>>,
    actors: BTreeMap<String, MarketActor>,
    modifiers: BTreeMap<String, PriceModifier>,
    /// Per-commodity drift curve components
    drift: BTreeMap<String, Vec<DriftComponent>>,
    dynamics: BTreeMap<String, CommodityDynamics>,
    /// Per-commodity daily price ring buffer
    price_history: BTreeMap<String, VecDeque<f64>>,
}

impl MarketEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Registration
    // ========================================================================

    pub fn add_commodity(&mut self, commodity: Commodity) {
        let id = commodity.id().to_string();
        self.dynamics.entry(id.clone()).or_default();
        self.price_history.entry(id.clone()).or_default();
        self.commodities.insert(id, commodity);
    }

    pub fn commodity(&self, id: &str) -> Option<&Commodity> {
        self.commodities.get(id)
    }

    pub fn commodity_mut(&mut self, id: &str) -> Option<&mut Commodity> {
        self.commodities.get_mut(id)
    }

    pub fn commodity_ids(&self) -> impl Iterator<Item = &str> {
        self.commodities.keys().map(|s| s.as_str())
    }

    pub fn add_group(&mut self, group_id: impl Into<String>) {
        self.groups.entry(group_id.into()).or_default();
    }

    pub fn add_commodity_to_group(
        &mut self,
        commodity_id: &str,
        group_id: &str,
    ) -> Result<(), MarketError> {
        if !self.commodities.contains_key(commodity_id) {
            return Err(MarketError::UnknownCommodity(commodity_id.to_string()));
        }
        let members = self
            .groups
            .get_mut(group_id)
            .ok_or_else(|| MarketError::UnknownGroup(group_id.to_string()))?;
        members.insert(commodity_id.to_string());
        Ok(())
    }

    /// Register a pricing actor. `influence` defaults to 1.0 (fully
    /// region-specific).
    pub fn add_actor(&mut self, region_id: impl Into<String>, parent: Option<&str>, influence: Option<f64>) {
        let id = region_id.into();
        self.actors.insert(
            id.clone(),
            MarketActor {
                id,
                parent: parent.map(|p| p.to_string()),
                influence: influence.unwrap_or(1.0).clamp(0.0, 1.0),
            },
        );
    }

    /// Configure drift components for a commodity (replaces any existing).
    pub fn set_drift(&mut self, commodity_id: impl Into<String>, components: Vec<DriftComponent>) {
        self.drift.insert(commodity_id.into(), components);
    }

    // ========================================================================
    // Modifier lifecycle
    // ========================================================================

    /// Register a modifier. Re-adding an existing id replaces the old
    /// modifier entirely.
    pub fn add_modifier(&mut self, modifier: PriceModifier) {
        self.modifiers.insert(modifier.id.clone(), modifier);
    }

    /// Activate a modifier, optionally re-scoping it. Returns false if the
    /// id is unknown.
    pub fn activate_modifier(&mut self, id: &str, scope: Option<ModifierScope>) -> bool {
        match self.modifiers.get_mut(id) {
            Some(modifier) => {
                if let Some(scope) = scope {
                    modifier.scope = scope;
                }
                modifier.active = true;
                true
            }
            None => false,
        }
    }

    /// Deactivate a modifier. Returns false if the id is unknown.
    pub fn deactivate_modifier(&mut self, id: &str) -> bool {
        match self.modifiers.get_mut(id) {
            Some(modifier) => {
                modifier.active = false;
                true
            }
            None => false,
        }
    }

    /// Remove a modifier by id. Silently no-ops if absent.
    pub fn remove_modifier(&mut self, id: &str) {
        self.modifiers.remove(id);
    }

    pub fn modifier(&self, id: &str) -> Option<&PriceModifier> {
        self.modifiers.get(id)
    }

    pub fn has_modifier(&self, id: &str) -> bool {
        self.modifiers.contains_key(id)
    }

    // ========================================================================
    // Pricing
    // ========================================================================

    /// Price of `commodity` at `time` in `region` (None = global market).
    ///
    /// Unknown commodities price at 0.0 — a sentinel, not an error, so a
    /// stale reference in a contract or event never aborts a tick.
    pub fn get_price(&self, commodity_id: &str, time: f64, region: Option<&str>) -> f64 {
        let Some(commodity) = self.commodities.get(commodity_id) else {
            return 0.0;
        };

        match region {
            None => self.raw_price(commodity, time, &[]),
            Some(region_id) => {
                let mut visited = HashSet::new();
                self.blended_price(commodity, time, region_id, &mut visited)
            }
        }
    }

    /// Region price blended toward the parent actor's price:
    /// `local × influence + parent × (1 − influence)`.
    fn blended_price(
        &self,
        commodity: &Commodity,
        time: f64,
        region_id: &str,
        visited: &mut HashSet<String>,
    ) -> f64 {
        if !visited.insert(region_id.to_string()) {
            // Actor cycle in config; fall back to the local price
            return self.raw_price(commodity, time, &self.scope_chain(region_id));
        }

        let local = self.raw_price(commodity, time, &self.scope_chain(region_id));
        let Some(actor) = self.actors.get(region_id) else {
            return local;
        };
        let Some(parent) = &actor.parent else {
            return local;
        };

        let parent_price = self.blended_price(commodity, time, parent, visited);
        (local * actor.influence + parent_price * (1.0 - actor.influence)).max(0.0)
    }

    /// The scope chain for a region: itself plus its actor ancestors.
    fn scope_chain(&self, region_id: &str) -> Vec<String> {
        let mut chain = vec![region_id.to_string()];
        let mut current = region_id;
        let mut guard = 0;
        while let Some(parent) = self.actors.get(current).and_then(|a| a.parent.as_deref()) {
            if chain.iter().any(|c| c == parent) || guard > 16 {
                break;
            }
            chain.push(parent.to_string());
            current = parent;
            guard += 1;
        }
        chain
    }

    /// Base price × (1 + drift) folded through BASE then TOTAL modifiers
    /// matching the commodity and the given scope chain. Clamped ≥ 0.
    fn raw_price(&self, commodity: &Commodity, time: f64, region_chain: &[String]) -> f64 {
        let commodity_groups = self.groups_of(commodity.id());

        let drift = self
            .drift
            .get(commodity.id())
            .map(|components| drift_sum(components, time))
            .unwrap_or(0.0);

        let mut price = commodity.base_price() * (1.0 + drift);

        for stacking in [ModifierStacking::Base, ModifierStacking::Total] {
            price = fold_phase(
                price,
                self.modifiers.values().filter(|m| {
                    m.active
                        && m.stacking == stacking
                        && m.matches_target(commodity.id(), &commodity_groups)
                        && m.matches_scope(region_chain)
                }),
            );
        }

        price.max(0.0)
    }

    /// Groups containing the given commodity.
    fn groups_of(&self, commodity_id: &str) -> BTreeSet<String> {
        self.groups
            .iter()
            .filter(|(_, members)| members.contains(commodity_id))
            .map(|(group, _)| group.clone())
            .collect()
    }

    pub fn price_history(&self, commodity_id: &str) -> Option<&VecDeque<f64>> {
        self.price_history.get(commodity_id)
    }

    pub fn dynamics(&self, commodity_id: &str) -> Option<&CommodityDynamics> {
        self.dynamics.get(commodity_id)
    }

    // ========================================================================
    // Daily update
    // ========================================================================

    /// Daily re-evaluation: random-walk each commodity's dynamics within
    /// their bounds, re-derive the reserved dynamic modifiers, and append
    /// today's global price to the history ring.
    pub fn process_daily_update(&mut self, time: f64, rng: &mut RngManager) {
        let ids: Vec<String> = self.commodities.keys().cloned().collect();

        for id in &ids {
            let dynamics = self.dynamics.entry(id.clone()).or_default();
            dynamics.trend = (dynamics.trend + rng.uniform(-0.05, 0.05)).clamp(-0.2, 0.2);
            dynamics.demand = (dynamics.demand + rng.uniform(-0.1, 0.1)).clamp(0.5, 1.5);
            dynamics.supply = (dynamics.supply + rng.uniform(-0.1, 0.1)).clamp(0.5, 1.5);
        }

        self.derive_dynamic_modifiers();

        for id in &ids {
            let price = self.get_price(id, time, None);
            let history = self.price_history.entry(id.clone()).or_default();
            history.push_back(price);
            while history.len() > PRICE_HISTORY_LEN {
                history.pop_front();
            }
        }
    }

    /// Re-derive the reserved `demand:`/`supply:`/`trend:` modifiers from
    /// the current dynamics. Re-adding replaces the previous day's entries.
    /// Also run after restore: these modifiers are never persisted.
    pub fn derive_dynamic_modifiers(&mut self) {
        let entries: Vec<(String, CommodityDynamics)> = self
            .dynamics
            .iter()
            .map(|(id, d)| (id.clone(), *d))
            .collect();

        for (id, dynamics) in entries {
            self.add_modifier(PriceModifier::new(
                format!("demand:{id}"),
                ModifierTarget::Commodity(id.clone()),
                dynamics.demand,
                ModifierKind::Multiplicative,
                ModifierStacking::Base,
            ));
            self.add_modifier(PriceModifier::new(
                format!("supply:{id}"),
                ModifierTarget::Commodity(id.clone()),
                1.0 / dynamics.supply,
                ModifierKind::Multiplicative,
                ModifierStacking::Base,
            ));
            self.add_modifier(PriceModifier::new(
                format!("trend:{id}"),
                ModifierTarget::Commodity(id.clone()),
                1.0 + dynamics.trend,
                ModifierKind::Multiplicative,
                ModifierStacking::Base,
            ));
        }
    }

    // ========================================================================
    // Snapshot
    // ========================================================================

    pub fn to_snapshot(&self) -> MarketSnapshot {
        MarketSnapshot {
            commodities: self.commodities.values().cloned().collect(),
            groups: self.groups.clone(),
            actors: self.actors.values().cloned().collect(),
            // Derived modifiers are regenerated from dynamics on restore
            modifiers: self
                .modifiers
                .values()
                .filter(|m| !DERIVED_PREFIXES.iter().any(|p| m.id.starts_with(p)))
                .cloned()
                .collect(),
            drift: self.drift.clone(),
            dynamics: self.dynamics.clone(),
            price_history: self
                .price_history
                .iter()
                .map(|(id, ring)| (id.clone(), ring.iter().copied().collect()))
                .collect(),
        }
    }

    pub fn from_snapshot(snapshot: MarketSnapshot) -> Self {
        let mut engine = Self::new();

        for commodity in snapshot.commodities {
            engine.add_commodity(commodity);
        }
        engine.groups = snapshot.groups;
        for actor in snapshot.actors {
            engine.actors.insert(actor.id.clone(), actor);
        }
        for modifier in snapshot.modifiers {
            engine.add_modifier(modifier);
        }
        engine.drift = snapshot.drift;
        engine.dynamics = snapshot.dynamics;
        for (id, history) in snapshot.price_history {
            engine.price_history.insert(id, history.into_iter().collect());
        }

        // Setup re-run: regenerate the non-persisted derived modifiers
        engine.derive_dynamic_modifiers();
        engine
    }
}

/// Serialized market state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub commodities: Vec<Commodity>,
    pub groups: BTreeMap<String, BTreeSet<String>>,
    pub actors: Vec<MarketActor>,
    pub modifiers: Vec<PriceModifier>,
    pub drift: BTreeMap<String, Vec<DriftComponent>>,
    pub dynamics: BTreeMap<String, CommodityDynamics>,
    pub price_history: BTreeMap<String, Vec<f64>>,
}
