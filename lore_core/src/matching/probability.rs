//! Probability gate and the injectable random source behind it.

use lore_model::LoreEntry;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of percentage rolls for the probability gate.
pub trait RandomSource {
    /// A uniformly distributed value in `[0, 100)`.
    fn roll_percent(&mut self) -> f64;
}

/// Thread-local OS-seeded randomness.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn roll_percent(&mut self) -> f64 {
        rand::rng().random_range(0.0..100.0)
    }
}

/// Deterministic generator seeded once.
#[derive(Debug, Clone)]
pub struct SeededRandom(StdRng);

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for SeededRandom {
    fn roll_percent(&mut self) -> f64 {
        self.0.random_range(0.0..100.0)
    }
}

/// Always rolls the same value.
#[derive(Debug, Clone, Copy)]
pub struct FixedRoll(pub f64);

impl RandomSource for FixedRoll {
    fn roll_percent(&mut self) -> f64 {
        self.0
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn roll_percent(&mut self) -> f64 {
        (**self).roll_percent()
    }
}

/// Evaluate the probability gate for one activation attempt.
///
/// Only consumes a roll when the outcome is actually uncertain.
pub fn passes_probability<R: RandomSource + ?Sized>(entry: &LoreEntry, rng: &mut R) -> bool {
    if !entry.use_probability || entry.probability >= 100 {
        return true;
    }
    if entry.probability == 0 {
        return false;
    }
    rng.roll_percent() < f64::from(entry.probability)
}
