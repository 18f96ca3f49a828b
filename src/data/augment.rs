//! Random oversampling of the encoded dataset.

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::EncodedExample;
use crate::error::{KinbagError, Result};

/// Which set each oversampling draw is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingPool {
    /// Sample from everything accumulated so far; growth compounds.
    #[default]
    Accumulated,
    /// Sample from the original examples only; growth is linear.
    Original,
}

/// Repeatedly appends a random fraction of the pool to the dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Oversampler {
    pub iterations: usize,
    /// Share of the pool drawn per iteration, without replacement
    pub fraction: f64,
    pub pool: SamplingPool,
}

impl Default for Oversampler {
    fn default() -> Self {
        Self {
            iterations: 20,
            fraction: 0.3,
            pool: SamplingPool::Accumulated,
        }
    }
}

/// Result of oversampling.
#[derive(Debug, Clone)]
pub struct Oversampled {
    pub examples: Vec<EncodedExample>,
    /// Dataset size after each iteration
    pub sizes: Vec<usize>,
}

impl Oversampler {
    pub fn new(iterations: usize, fraction: f64, pool: SamplingPool) -> Self {
        Self {
            iterations,
            fraction,
            pool,
        }
    }

    /// Number of examples drawn from a pool of `pool_len`. Always at least one
    /// so the dataset strictly grows.
    fn draw_size(&self, pool_len: usize) -> usize {
        ((pool_len as f64 * self.fraction).round() as usize).clamp(1, pool_len)
    }

    pub fn oversample<R: Rng + ?Sized>(&self, base: &[EncodedExample], rng: &mut R) -> Result<Oversampled> {
        if base.is_empty() {
            return Err(KinbagError::EmptyDataset("nothing to oversample"));
        }
        if !(self.fraction > 0.0 && self.fraction <= 1.0) {
            return Err(KinbagError::Config(format!(
                "oversampling fraction must be in (0, 1], got {}",
                self.fraction
            )));
        }

        let mut examples = base.to_vec();
        let mut sizes = Vec::with_capacity(self.iterations);

        for iteration in 0..self.iterations {
            let pool_len = match self.pool {
                SamplingPool::Accumulated => examples.len(),
                SamplingPool::Original => base.len(),
            };
            let amount = self.draw_size(pool_len);
            let picked = index::sample(rng, pool_len, amount);

            examples.reserve(amount);
            for i in picked.iter() {
                let ex = examples[i].clone();
                examples.push(ex);
            }
            sizes.push(examples.len());

            tracing::trace!(iteration, drawn = amount, size = examples.len(), "oversampled");
        }

        tracing::debug!(
            base = base.len(),
            augmented = examples.len(),
            pool = ?self.pool,
            "oversampling finished"
        );

        Ok(Oversampled { examples, sizes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn base(n: usize) -> Vec<EncodedExample> {
        (0..n)
            .map(|i| EncodedExample {
                head: i + 1,
                tail: i + 2,
                label: vec![1.0, 0.0],
            })
            .collect()
    }

    #[test]
    fn test_size_strictly_increases() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let out = Oversampler::default().oversample(&base(10), &mut rng).unwrap();

        assert_eq!(out.sizes.len(), 20);
        let mut prev = 10;
        for &size in &out.sizes {
            assert!(size > prev, "{} should exceed {}", size, prev);
            prev = size;
        }
        assert_eq!(out.examples.len(), *out.sizes.last().unwrap());
    }

    #[test]
    fn test_accumulated_pool_compounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let out = Oversampler::new(3, 0.3, SamplingPool::Accumulated)
            .oversample(&base(100), &mut rng)
            .unwrap();
        // 100 -> 130 -> 169 -> 220
        assert_eq!(out.sizes, vec![130, 169, 220]);
    }

    #[test]
    fn test_original_pool_is_linear() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let out = Oversampler::new(4, 0.3, SamplingPool::Original)
            .oversample(&base(100), &mut rng)
            .unwrap();
        assert_eq!(out.sizes, vec![130, 160, 190, 220]);
        // Only base examples are ever drawn
        assert!(out.examples.iter().all(|e| e.head <= 100));
    }

    #[test]
    fn test_tiny_input_still_grows() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let out = Oversampler::new(3, 0.3, SamplingPool::Accumulated)
            .oversample(&base(1), &mut rng)
            .unwrap();
        assert_eq!(out.sizes, vec![2, 3, 4]);
    }

    #[test]
    fn test_empty_input_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(matches!(
            Oversampler::default().oversample(&[], &mut rng),
            Err(KinbagError::EmptyDataset(_))
        ));
    }

    #[test]
    fn test_same_seed_same_output() {
        let a = Oversampler::default()
            .oversample(&base(12), &mut ChaCha8Rng::seed_from_u64(9))
            .unwrap();
        let b = Oversampler::default()
            .oversample(&base(12), &mut ChaCha8Rng::seed_from_u64(9))
            .unwrap();
        assert_eq!(a.examples, b.examples);
    }
}
