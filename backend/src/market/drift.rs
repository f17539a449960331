//! Time-based price drift
//!
//! Drift components shape a commodity's price over time independently of
//! modifiers: periodic (seasonal) sinusoids and linear growth. Components
//! sum to a fractional adjustment applied as `price × (1 + Σ components)`.

use crate::core::time::SECONDS_PER_DAY;
use serde::{Deserialize, Serialize};

/// One drift curve component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "curve", rename_all = "snake_case")]
pub enum DriftComponent {
    /// Periodic oscillation: amplitude × sin(2π × time / period)
    Sinusoidal {
        /// Peak fractional adjustment (0.1 = ±10%)
        amplitude: f64,
        /// Period in simulated seconds
        period: f64,
    },

    /// Steady growth (or decay): rate per game day
    LinearGrowth {
        /// Fractional change per day (0.01 = +1%/day)
        rate_per_day: f64,
    },
}

impl DriftComponent {
    /// Fractional price adjustment contributed at `time`.
    pub fn value_at(&self, time: f64) -> f64 {
        match self {
            DriftComponent::Sinusoidal { amplitude, period } => {
                if *period <= 0.0 {
                    return 0.0;
                }
                amplitude * (2.0 * std::f64::consts::PI * time / period).sin()
            }
            DriftComponent::LinearGrowth { rate_per_day } => rate_per_day * (time / SECONDS_PER_DAY),
        }
    }
}

/// Sum of all components at `time`.
pub fn drift_sum(components: &[DriftComponent], time: f64) -> f64 {
    components.iter().map(|c| c.value_at(time)).sum()
}
