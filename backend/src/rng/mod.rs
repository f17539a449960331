//! Deterministic random number generation
//!
//! Uses xorshift64* for fast, deterministic random number generation.
//! CRITICAL: All randomness in the simulation MUST go through this module.
//! Entity-scoped draws (e.g. carrier vetting) derive a private generator via
//! [`RngManager::scoped`] instead of reseeding the shared one.

mod xorshift;

pub use xorshift::RngManager;
