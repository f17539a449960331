//! Commodity model
//!
//! A tradeable good with a base price. Base price is the only mutable field;
//! everything else is fixed at creation. Pricing (modifiers, drift, regional
//! blending) lives in the market engine — a `Commodity` only carries the
//! anchor value the engine starts from.

use serde::{Deserialize, Serialize};

/// A tradeable commodity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commodity {
    /// Unique commodity identifier ("STEEL")
    id: String,

    /// Display name ("Steel")
    name: String,

    /// Category tag ("raw_materials", "consumer_goods", …)
    category: String,

    /// Anchor price before modifiers/drift (whole currency units)
    base_price: f64,
}

impl Commodity {
    /// Create a new commodity.
    ///
    /// # Panics
    /// Panics if `base_price` is negative.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        base_price: f64,
    ) -> Self {
        assert!(base_price >= 0.0, "base_price must be non-negative");
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            base_price,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn base_price(&self) -> f64 {
        self.base_price
    }

    /// Re-anchor the base price (rare; e.g. a permanent economic outcome).
    /// Negative values are clamped to zero.
    pub fn set_base_price(&mut self, price: f64) {
        self.base_price = price.max(0.0);
    }
}
