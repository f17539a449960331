//! xorshift64* random number generator
//!
//! Fast, high-quality PRNG suitable for simulation: 64-bit state, 64-bit
//! output, passes BigCrush.
//!
//! # Determinism
//!
//! Same seed → same sequence. This is CRITICAL for:
//! - Debugging (reproduce an exact run)
//! - Testing (assert on concrete outcomes)
//! - Replay (a checkpoint stores the generator state verbatim)
//!
//! One `RngManager` is threaded through every engine by the simulation root.
//! Checks that must not perturb the shared stream (per-entity vetting) use
//! [`RngManager::scoped`], which derives an independent generator from the
//! base seed and a label.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use freight_simulator_core_rs::RngManager;
///
/// let mut rng = RngManager::new(12345);
/// let value = rng.next();
/// let roll = rng.range(0, 100); // [0, 100)
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngManager {
    /// Internal state (64-bit)
    state: u64,
}

impl RngManager {
    /// Create a new RNG with the given seed
    pub fn new(seed: u64) -> Self {
        // Ensure seed is never zero (xorshift requirement)
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Derive an independent generator from a base seed and a label.
    ///
    /// The label is typically an entity id ("carrier_000004"). The derived
    /// stream is stable for a given (seed, label) pair and consuming it
    /// never advances the shared generator.
    pub fn scoped(base_seed: u64, label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(base_seed.to_le_bytes());
        hasher.update(label.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        Self::new(u64::from_le_bytes(bytes))
    }

    /// Generate the next random u64, advancing the internal state.
    pub fn next(&mut self) -> u64 {
        // xorshift64* algorithm
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Generate a random value in `[min, max)`.
    ///
    /// # Panics
    /// Panics if min >= max
    pub fn range(&mut self, min: i64, max: i64) -> i64 {
        assert!(min < max, "min must be less than max");

        let value = self.next();
        let range_size = (max - min) as u64;
        min + (value % range_size) as i64
    }

    /// Generate a random f64 in `[0.0, 1.0)`.
    pub fn next_f64(&mut self) -> f64 {
        let value = self.next();
        // Convert to [0.0, 1.0) using the top 53 bits
        (value >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }

    /// Generate a random f64 uniformly in `[min, max)`.
    ///
    /// # Panics
    /// Panics if min > max
    pub fn uniform(&mut self, min: f64, max: f64) -> f64 {
        assert!(min <= max, "min must not exceed max");
        min + self.next_f64() * (max - min)
    }

    /// Bernoulli draw: true with probability `p` (clamped to [0, 1]).
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p.clamp(0.0, 1.0)
    }

    /// Pick an index from a slice of non-negative weights.
    ///
    /// Zero-total weights degrade to uniform selection. Returns `None` for
    /// an empty slice.
    pub fn weighted_index(&mut self, weights: &[f64]) -> Option<usize> {
        if weights.is_empty() {
            return None;
        }

        let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
        if total <= 0.0 {
            return Some(self.range(0, weights.len() as i64) as usize);
        }

        let mut target = self.next_f64() * total;
        for (idx, weight) in weights.iter().enumerate() {
            if *weight <= 0.0 {
                continue;
            }
            target -= weight;
            if target <= 0.0 {
                return Some(idx);
            }
        }

        // Float round-off: fall back to the last positive weight
        weights.iter().rposition(|w| *w > 0.0)
    }

    /// Get the current generator state (for checkpointing/replay).
    pub fn get_state(&self) -> u64 {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_seed_converted_to_nonzero() {
        let rng = RngManager::new(0);
        assert_ne!(rng.get_state(), 0, "Zero seed should be converted to 1");
    }

    #[test]
    #[should_panic(expected = "min must be less than max")]
    fn test_range_invalid_bounds() {
        let mut rng = RngManager::new(12345);
        rng.range(100, 50); // min > max should panic
    }

    #[test]
    fn test_next_f64_in_range() {
        let mut rng = RngManager::new(12345);

        for _ in 0..1000 {
            let val = rng.next_f64();
            assert!(
                (0.0..1.0).contains(&val),
                "next_f64() produced value {} outside [0.0, 1.0)",
                val
            );
        }
    }

    #[test]
    fn test_next_f64_deterministic() {
        let mut rng1 = RngManager::new(99999);
        let mut rng2 = RngManager::new(99999);

        for _ in 0..100 {
            assert_eq!(rng1.next_f64(), rng2.next_f64(), "next_f64() not deterministic");
        }
    }

    #[test]
    fn test_uniform_respects_bounds() {
        let mut rng = RngManager::new(7);

        for _ in 0..1000 {
            let val = rng.uniform(30.0, 120.0);
            assert!((30.0..120.0).contains(&val));
        }
    }

    #[test]
    fn test_chance_extremes() {
        let mut rng = RngManager::new(7);

        for _ in 0..100 {
            assert!(rng.chance(1.1), "p >= 1 must always succeed");
            assert!(!rng.chance(0.0), "p = 0 must never succeed");
        }
    }

    #[test]
    fn test_weighted_index_prefers_heavy_weight() {
        let mut rng = RngManager::new(42);
        let weights = [10.0, 1.0];

        let mut heavy = 0;
        for _ in 0..1000 {
            if rng.weighted_index(&weights) == Some(0) {
                heavy += 1;
            }
        }

        assert!(heavy > 700, "10:1 weights selected index 0 only {} times", heavy);
    }

    #[test]
    fn test_weighted_index_empty_and_zero() {
        let mut rng = RngManager::new(42);

        assert_eq!(rng.weighted_index(&[]), None);

        // All-zero weights degrade to uniform, still in range
        let idx = rng.weighted_index(&[0.0, 0.0, 0.0]).unwrap();
        assert!(idx < 3);
    }

    #[test]
    fn test_scoped_independent_of_shared_stream() {
        let mut shared = RngManager::new(1234);
        let before = shared.get_state();

        let mut scoped_a = RngManager::scoped(1234, "carrier_000001");
        let _ = scoped_a.next_f64();

        assert_eq!(shared.get_state(), before, "scoped draw perturbed shared state");

        // Same (seed, label) pair reproduces the same stream
        let mut scoped_b = RngManager::scoped(1234, "carrier_000001");
        let mut scoped_c = RngManager::scoped(1234, "carrier_000001");
        assert_eq!(scoped_b.next(), scoped_c.next());

        // Different labels diverge
        let mut scoped_d = RngManager::scoped(1234, "carrier_000002");
        let mut scoped_e = RngManager::scoped(1234, "carrier_000001");
        assert_ne!(scoped_d.next(), scoped_e.next());
    }
}
