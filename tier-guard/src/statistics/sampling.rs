//! Bounded uniform down-sampling of large samples.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

/// Default cap on the number of values any test sees.
pub const DEFAULT_MAX_SAMPLE_SIZE: usize = 5000;

/// Draws uniform samples without replacement, capped at a maximum size.
#[derive(Debug, Clone)]
pub struct Sampler {
    max_size: usize,
    rng: StdRng,
}

impl Sampler {
    /// Creates a sampler. A `seed` makes the draws reproducible.
    pub fn new(max_size: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Self { max_size, rng }
    }

    /// The configured cap.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Returns `values` unchanged when within the cap, otherwise a uniform
    /// sample of `max_size` values in their original relative order.
    pub fn sample(&mut self, values: Vec<f64>) -> Vec<f64> {
        if values.len() <= self.max_size {
            return values;
        }
        let mut picked = rand::seq::index::sample(&mut self.rng, values.len(), self.max_size).into_vec();
        picked.sort_unstable();
        debug!(
            original = values.len(),
            sampled = picked.len(),
            "Down-sampled values"
        );
        picked.into_iter().map(|i| values[i]).collect()
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SAMPLE_SIZE, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_sample_untouched() {
        let mut sampler = Sampler::new(10, Some(1));
        let values = vec![3.0, 1.0, 2.0];
        assert_eq!(sampler.sample(values.clone()), values);
    }

    #[test]
    fn test_large_sample_capped_without_replacement() {
        let mut sampler = Sampler::new(100, Some(7));
        let values: Vec<f64> = (0..1000).map(f64::from).collect();
        let out = sampler.sample(values);
        assert_eq!(out.len(), 100);
        // Relative order preserved, so distinct indices show up strictly increasing.
        assert!(out.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_seed_is_reproducible() {
        let values: Vec<f64> = (0..500).map(f64::from).collect();
        let a = Sampler::new(50, Some(42)).sample(values.clone());
        let b = Sampler::new(50, Some(42)).sample(values);
        assert_eq!(a, b);
    }
}
