//! Region and city models
//!
//! Regions are static groupings (risk, economy strength, weather
//! susceptibility) used for price scoping and event targeting. Cities carry
//! slow-moving condition values (congestion, risk) that random-walk once per
//! day during the map daily update.

use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A geographic/economic region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    id: String,
    name: String,
    /// Baseline hazard level for lanes/cities in this region, 0..1
    risk_factor: f64,
    /// Relative economic strength, 1.0 = neutral
    economy_strength: f64,
    /// How strongly weather events hit this region, 0..1
    weather_susceptibility: f64,
    /// Ids of member cities
    cities: HashSet<String>,
}

impl Region {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        risk_factor: f64,
        economy_strength: f64,
        weather_susceptibility: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            risk_factor: risk_factor.clamp(0.0, 1.0),
            economy_strength: economy_strength.max(0.0),
            weather_susceptibility: weather_susceptibility.clamp(0.0, 1.0),
            cities: HashSet::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn risk_factor(&self) -> f64 {
        self.risk_factor
    }

    pub fn economy_strength(&self) -> f64 {
        self.economy_strength
    }

    pub fn weather_susceptibility(&self) -> f64 {
        self.weather_susceptibility
    }

    pub fn cities(&self) -> &HashSet<String> {
        &self.cities
    }

    pub fn add_city(&mut self, city_id: impl Into<String>) {
        self.cities.insert(city_id.into());
    }

    pub fn contains_city(&self, city_id: &str) -> bool {
        self.cities.contains(city_id)
    }
}

/// A city on the map.
///
/// Position is an opaque 2D coordinate used only for distance bookkeeping by
/// collaborators; the core never simulates movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    id: String,
    name: String,
    region_id: String,
    position: (f64, f64),
    population: u64,
    /// Infrastructure quality, 0..1
    infrastructure: f64,
    /// Commodity/category tags produced or demanded here
    industries: HashSet<String>,
    /// Current congestion level, 0..1 (random-walks daily)
    congestion: f64,
    /// Current local risk level, 0..1 (random-walks daily)
    risk: f64,
}

impl City {
    /// Create a city. Initial congestion and risk are derived from
    /// population, infrastructure, and the owning region's risk factor.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        region_id: impl Into<String>,
        position: (f64, f64),
        population: u64,
        infrastructure: f64,
        industries: HashSet<String>,
        region_risk_factor: f64,
    ) -> Self {
        let infrastructure = infrastructure.clamp(0.0, 1.0);
        let congestion =
            ((population as f64 / 2_000_000.0) * (1.0 - 0.5 * infrastructure)).clamp(0.0, 1.0);
        let risk = (region_risk_factor * (1.0 - 0.5 * infrastructure)).clamp(0.0, 1.0);

        Self {
            id: id.into(),
            name: name.into(),
            region_id: region_id.into(),
            position,
            population,
            infrastructure,
            industries,
            congestion,
            risk,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn region_id(&self) -> &str {
        &self.region_id
    }

    pub fn position(&self) -> (f64, f64) {
        self.position
    }

    pub fn population(&self) -> u64 {
        self.population
    }

    pub fn infrastructure(&self) -> f64 {
        self.infrastructure
    }

    pub fn industries(&self) -> &HashSet<String> {
        &self.industries
    }

    pub fn congestion(&self) -> f64 {
        self.congestion
    }

    pub fn risk(&self) -> f64 {
        self.risk
    }

    /// Daily bounded random walk on congestion and risk.
    ///
    /// Congestion drifts by ±0.05, risk by ±0.03, both clamped to [0, 1].
    pub fn daily_condition_walk(&mut self, rng: &mut RngManager) {
        self.congestion = (self.congestion + rng.uniform(-0.05, 0.05)).clamp(0.0, 1.0);
        self.risk = (self.risk + rng.uniform(-0.03, 0.03)).clamp(0.0, 1.0);
    }
}
