//! Seeded random sampling utilities.

use rand::prelude::*;

/// Random number source for embeddings; seedable for reproducible runs.
pub struct RandomSampler {
    rng: StdRng,
}

impl RandomSampler {
    /// Create a sampler with a random seed.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a sampler with a specific seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create a sampler from an optional seed.
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::with_seed(s),
            None => Self::new(),
        }
    }

    /// A random float in [0, 1).
    pub fn random_f32(&mut self) -> f32 {
        self.rng.gen()
    }

    /// A random float in [low, high).
    pub fn random_range(&mut self, low: f32, high: f32) -> f32 {
        self.rng.gen_range(low..high)
    }

    /// A random index in [0, n).
    pub fn index(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }

    /// A random pair of distinct indices in [0, n); requires n >= 2.
    pub fn distinct_pair(&mut self, n: usize) -> (usize, usize) {
        let i = self.index(n);
        let mut j = self.index(n - 1);
        if j >= i {
            j += 1;
        }
        (i, j)
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::new()
    }
}
