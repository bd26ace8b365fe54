//! Random jitter source for shift points and engine noise

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

/// Per-vehicle random source
///
/// Uses a seeded RNG when one is supplied so runs can be reproduced,
/// otherwise falls back to the thread-local generator.
#[derive(Debug, Clone, Default)]
pub struct SimRng {
    rng: Option<StdRng>,
}

impl SimRng {
    pub fn new() -> Self {
        Self { rng: None }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Some(StdRng::seed_from_u64(seed)),
        }
    }

    /// Uniform sample in `[low, high)`; returns `low` for an empty range
    pub fn range(&mut self, low: f32, high: f32) -> f32 {
        if high <= low {
            return low;
        }
        match &mut self.rng {
            Some(rng) => rng.random_range(low..high),
            None => rand::rng().random_range(low..high),
        }
    }
}
