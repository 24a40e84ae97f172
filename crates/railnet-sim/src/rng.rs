//! Seeded randomness for removal orders.
//!
//! Wraps `ChaCha8Rng`, whose output stream is fixed across platforms and
//! `rand` releases, so one seed always yields the same removal order.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// Default seed used when none is configured.
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone)]
pub struct SimRng(ChaCha8Rng);

impl Default for SimRng {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl SimRng {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Shuffle `items` in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.0);
    }
}
