//! This module provides a small random number generation facade on top of
//! the abstractions of the standard "rand" crate.

use crate::numeric::Float;
use rand::{Rng, SeedableRng};

// Select random number generation engine in use
#[cfg(feature = "f32")]
type Engine = rand_xoshiro::Xoshiro128Plus;
#[cfg(not(feature = "f32"))]
type Engine = rand_xoshiro::Xoshiro256Plus;

/// Seed used when none is specified
const DEFAULT_SEED: u64 = 12345;

/// Deterministic random number generator
#[derive(Clone)]
pub struct RandGenerator {
    rng: Engine,
}
//
impl RandGenerator {
    /// Spawn a new random number generator with the default seed
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    /// Spawn a new random number generator with a given seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Engine::seed_from_u64(seed),
        }
    }

    // Generate a random floating-point number between 0 and 1
    pub fn random(&mut self) -> Float {
        self.rng.gen()
    }

    /// Generate a floating-point number uniformly distributed in [low, high)
    pub fn uniform(&mut self, low: Float, high: Float) -> Float {
        low + (high - low) * self.random()
    }

    /// Generate an integer uniformly distributed in [0, max]
    pub fn count(&mut self, max: usize) -> usize {
        self.rng.gen_range(0..=max)
    }

    /// Truth of an event of probability `p`
    pub fn chance(&mut self, p: Float) -> bool {
        self.random() < p
    }
}
//
impl Default for RandGenerator {
    fn default() -> Self {
        Self::new()
    }
}
