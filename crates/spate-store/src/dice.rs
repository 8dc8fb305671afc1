//! Random draws for production variation and consumption size.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform random integers.
///
/// Production and consumption only ever ask for a draw from `0..=max`, so
/// that is the whole interface. Tests substitute scripted implementations.
pub trait Dice: Send + Sync {
    /// Uniform draw from `0..=max`.
    fn roll(&self, max: u64) -> u64;
}

/// Draws from the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDice;

impl Dice for ThreadDice {
    fn roll(&self, max: u64) -> u64 {
        rand::thread_rng().gen_range(0..=max)
    }
}

/// Reproducible draws from a seeded generator.
#[derive(Debug)]
pub struct SeededDice {
    rng: Mutex<StdRng>,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Dice for SeededDice {
    fn roll(&self, max: u64) -> u64 {
        self.rng.lock().gen_range(0..=max)
    }
}
