//! Price modifiers
//!
//! A modifier adjusts the price of one commodity, a commodity group, or the
//! whole market, optionally scoped to a region. BASE modifiers combine with
//! each other first (multiplicative by product, additive by sum); TOTAL
//! modifiers apply on top of the BASE aggregate. Composition is commutative
//! within a kind — insertion order never affects the result.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How a modifier's magnitude combines with the price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierKind {
    /// Price × magnitude
    Multiplicative,
    /// Price + magnitude
    Additive,
}

/// Which stacking phase the modifier participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierStacking {
    /// Folded into the base aggregate
    Base,
    /// Applied after all BASE modifiers
    Total,
}

/// What the modifier targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", content = "id", rename_all = "snake_case")]
pub enum ModifierTarget {
    Commodity(String),
    Group(String),
    /// Applies to every commodity
    Global,
}

/// Where the modifier applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "snake_case")]
pub enum ModifierScope {
    Region(String),
    /// Applies everywhere
    Global,
}

/// A named price adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceModifier {
    pub id: String,
    pub target: ModifierTarget,
    pub magnitude: f64,
    pub kind: ModifierKind,
    pub stacking: ModifierStacking,
    pub active: bool,
    pub scope: ModifierScope,
}

impl PriceModifier {
    /// Create an active, globally-scoped modifier.
    pub fn new(
        id: impl Into<String>,
        target: ModifierTarget,
        magnitude: f64,
        kind: ModifierKind,
        stacking: ModifierStacking,
    ) -> Self {
        Self {
            id: id.into(),
            target,
            magnitude,
            kind,
            stacking,
            active: true,
            scope: ModifierScope::Global,
        }
    }

    /// Builder: scope the modifier to a region.
    pub fn with_scope(mut self, scope: ModifierScope) -> Self {
        self.scope = scope;
        self
    }

    /// Builder: start the modifier inactive (activated later per scope).
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Does this modifier apply to the given commodity?
    ///
    /// `commodity_groups` is the set of groups the commodity belongs to.
    pub fn matches_target(&self, commodity_id: &str, commodity_groups: &BTreeSet<String>) -> bool {
        match &self.target {
            ModifierTarget::Commodity(id) => id == commodity_id,
            ModifierTarget::Group(group) => commodity_groups.contains(group),
            ModifierTarget::Global => true,
        }
    }

    /// Does this modifier apply in the queried region chain?
    ///
    /// `region_chain` is the queried region plus its ancestors; an empty
    /// chain means a global (region-less) query, matched only by globally
    /// scoped modifiers.
    pub fn matches_scope(&self, region_chain: &[String]) -> bool {
        match &self.scope {
            ModifierScope::Global => true,
            ModifierScope::Region(region) => region_chain.iter().any(|r| r == region),
        }
    }
}

/// Fold one stacking phase over a price:
/// `price × Π(multiplicative magnitudes) + Σ(additive magnitudes)`.
pub fn fold_phase<'a, I>(price: f64, modifiers: I) -> f64
where
    I: Iterator<Item = &'a PriceModifier>,
{
    let mut product = 1.0;
    let mut sum = 0.0;
    for modifier in modifiers {
        match modifier.kind {
            ModifierKind::Multiplicative => product *= modifier.magnitude,
            ModifierKind::Additive => sum += modifier.magnitude,
        }
    }
    price * product + sum
}
