//! Random train / validation / test partition.

use rand::seq::SliceRandom;
use rand::Rng;

use super::EncodedExample;
use crate::error::{KinbagError, Result};

/// Three disjoint partitions of the augmented dataset.
///
/// Disjoint by position, not by content: oversampling duplicates examples, so
/// the same `(head, tail, label)` can appear in more than one split.
#[derive(Debug, Clone, Default)]
pub struct DatasetSplit {
    pub train: Vec<EncodedExample>,
    pub validation: Vec<EncodedExample>,
    pub test: Vec<EncodedExample>,
}

impl DatasetSplit {
    /// Shuffle, carve off `ceil(test_fraction * n)` for test, then
    /// `ceil(validation_fraction * rest)` of the rest for validation.
    pub fn partition<R: Rng + ?Sized>(
        mut examples: Vec<EncodedExample>,
        test_fraction: f64,
        validation_fraction: f64,
        rng: &mut R,
    ) -> Result<Self> {
        for (name, f) in [("test", test_fraction), ("validation", validation_fraction)] {
            if !(0.0..1.0).contains(&f) {
                return Err(KinbagError::Config(format!(
                    "{} fraction must be in [0, 1), got {}",
                    name, f
                )));
            }
        }

        examples.shuffle(rng);

        let n_test = (examples.len() as f64 * test_fraction).ceil() as usize;
        let rest = examples.split_off(n_test);
        let test = examples;

        let mut rest = rest;
        let n_val = (rest.len() as f64 * validation_fraction).ceil() as usize;
        let train = rest.split_off(n_val);
        let validation = rest;

        tracing::debug!(
            train = train.len(),
            validation = validation.len(),
            test = test.len(),
            "split dataset"
        );

        Ok(Self {
            train,
            validation,
            test,
        })
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    /// Examples whose head index doubles as a unique id
    fn numbered(n: usize) -> Vec<EncodedExample> {
        (0..n)
            .map(|i| EncodedExample {
                head: i,
                tail: 0,
                label: vec![1.0],
            })
            .collect()
    }

    #[test]
    fn test_splits_disjoint_and_complete() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let split = DatasetSplit::partition(numbered(1000), 0.1, 0.1, &mut rng).unwrap();

        assert_eq!(split.test.len(), 100);
        assert_eq!(split.validation.len(), 90);
        assert_eq!(split.train.len(), 810);
        assert_eq!(split.len(), 1000);

        let ids = |v: &[EncodedExample]| v.iter().map(|e| e.head).collect::<HashSet<_>>();
        let (tr, va, te) = (ids(&split.train), ids(&split.validation), ids(&split.test));
        assert!(tr.is_disjoint(&va));
        assert!(tr.is_disjoint(&te));
        assert!(va.is_disjoint(&te));
        assert_eq!(tr.len() + va.len() + te.len(), 1000);
    }

    #[test]
    fn test_rounding_on_small_sets() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let split = DatasetSplit::partition(numbered(15), 0.1, 0.1, &mut rng).unwrap();
        // ceil(1.5) = 2 test, ceil(1.3) = 2 validation
        assert_eq!(split.test.len(), 2);
        assert_eq!(split.validation.len(), 2);
        assert_eq!(split.train.len(), 11);
    }

    #[test]
    fn test_partition_is_shuffled() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let split = DatasetSplit::partition(numbered(200), 0.1, 0.1, &mut rng).unwrap();
        let test_ids: Vec<usize> = split.test.iter().map(|e| e.head).collect();
        assert_ne!(test_ids, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_invalid_fraction() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert!(matches!(
            DatasetSplit::partition(numbered(10), 1.0, 0.1, &mut rng),
            Err(KinbagError::Config(_))
        ));
    }
}
