//! Uniform random choice over the current set of coaster ids
//!
//! One RNG is seeded from OS entropy when the selector is built and then
//! shared by every request, instead of reseeding per call.

use std::sync::{Mutex, PoisonError};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Picks one identifier uniformly at random
#[derive(Debug)]
pub struct RandomSelector {
    rng: Mutex<ChaCha8Rng>,
}

impl RandomSelector {
    /// Create a selector seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::from_entropy()),
        }
    }

    /// Create a deterministic selector (for tests)
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Choose one of `ids`, or `None` when there is nothing to choose from
    pub fn pick(&self, ids: &[String]) -> Option<String> {
        match ids.len() {
            0 => None,
            1 => Some(ids[0].clone()),
            n => {
                let index = self.index(n);
                Some(ids[index].clone())
            }
        }
    }

    fn index(&self, n: usize) -> usize {
        // A panic elsewhere cannot leave the RNG in a torn state.
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(0..n)
    }
}

impl Default for RandomSelector {
    fn default() -> Self {
        Self::new()
    }
}
