//! Shared random source for crossing and stagger durations

use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::config::RangeConfig;

/// Random duration sampler shared by all travelers.
///
/// Has its own lock, independent of the lane lock, so drawing a duration
/// never contends with admission.
pub struct Jitter {
    rng: Mutex<StdRng>,
}

impl Jitter {
    /// Seeded sampler when `seed` is set, OS-seeded otherwise
    pub fn new(seed: Option<u64>) -> Self {
        debug!(?seed, "Jitter::new: called");
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng: Mutex::new(rng) }
    }

    /// Draw a value in `range`, bounds included
    pub fn between(&self, range: RangeConfig) -> u64 {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.random_range(range.min..=range.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_within_range() {
        let jitter = Jitter::new(None);
        for _ in 0..200 {
            let v = jitter.between(RangeConfig::new(1, 3));
            assert!((1..=3).contains(&v));
        }
    }

    #[test]
    fn test_degenerate_range() {
        let jitter = Jitter::new(Some(1));
        assert_eq!(jitter.between(RangeConfig::new(5, 5)), 5);
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = Jitter::new(Some(42));
        let b = Jitter::new(Some(42));
        let range = RangeConfig::new(0, 1_000_000);
        let draws_a: Vec<_> = (0..10).map(|_| a.between(range)).collect();
        let draws_b: Vec<_> = (0..10).map(|_| b.between(range)).collect();
        assert_eq!(draws_a, draws_b);
    }
}
