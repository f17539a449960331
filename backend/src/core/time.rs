//! Time management for the simulation
//!
//! Game time is a continuous f64 second count advanced by `elapsed × scale`.
//! A game day is a fixed 600-second window; crossing one or more day
//! boundaries in a single advance reports every crossed day, in order, so
//! the daily cascade can run once per elapsed day (recurring charges are
//! never skipped by a large advance).

use serde::{Deserialize, Serialize};

/// Length of one game day in simulated seconds.
pub const SECONDS_PER_DAY: f64 = 600.0;

/// Manages continuous simulation time and day boundaries
///
/// # Example
/// ```
/// use freight_simulator_core_rs::GameClock;
///
/// let mut clock = GameClock::new(1.0);
/// assert_eq!(clock.current_day(), 0);
///
/// let crossed = clock.advance(650.0);
/// assert_eq!(crossed, vec![1]);
/// assert_eq!(clock.current_day(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameClock {
    /// Total simulated seconds elapsed since start
    current_time: f64,
    /// Multiplier applied to every advance delta
    time_scale: f64,
    /// Last day number for which the boundary was reported
    last_reported_day: u64,
}

impl GameClock {
    /// Create a new clock at time zero.
    ///
    /// # Panics
    /// Panics if `time_scale` is not strictly positive.
    pub fn new(time_scale: f64) -> Self {
        assert!(time_scale > 0.0, "time_scale must be positive");
        Self {
            current_time: 0.0,
            time_scale,
            last_reported_day: 0,
        }
    }

    /// Restore a clock from checkpointed state.
    pub fn from_snapshot(current_time: f64, time_scale: f64, last_reported_day: u64) -> Self {
        assert!(time_scale > 0.0, "time_scale must be positive");
        Self {
            current_time,
            time_scale,
            last_reported_day,
        }
    }

    /// Advance time by `delta` (pre-scale) seconds.
    ///
    /// Returns the list of day numbers whose boundary was crossed by this
    /// advance, in increasing order; empty when no boundary was crossed.
    /// Negative deltas are ignored: time is monotonic.
    pub fn advance(&mut self, delta: f64) -> Vec<u64> {
        if delta <= 0.0 {
            return Vec::new();
        }

        self.current_time += delta * self.time_scale;

        let day_now = self.current_day();
        let crossed: Vec<u64> = (self.last_reported_day + 1..=day_now).collect();
        self.last_reported_day = day_now;
        crossed
    }

    /// Current simulated time in seconds.
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Current day number (0-indexed).
    pub fn current_day(&self) -> u64 {
        (self.current_time / SECONDS_PER_DAY) as u64
    }

    /// Seconds elapsed within the current day.
    pub fn time_within_day(&self) -> f64 {
        self.current_time % SECONDS_PER_DAY
    }

    /// Current time-scale multiplier.
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Change the time-scale multiplier (e.g. fast-forward).
    ///
    /// # Panics
    /// Panics if `scale` is not strictly positive.
    pub fn set_time_scale(&mut self, scale: f64) {
        assert!(scale > 0.0, "time_scale must be positive");
        self.time_scale = scale;
    }

    /// Last day number already reported by [`GameClock::advance`].
    pub fn last_reported_day(&self) -> u64 {
        self.last_reported_day
    }
}
