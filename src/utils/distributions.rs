//! Distribution utilities
use ndarray::{Array1, ArrayView1};
use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::Rng;
use thiserror::Error;

/// Categorical distribution over the indices `0 .. n`.
#[derive(Debug, Clone)]
pub struct Categorical {
    weights: WeightedIndex<f64>,
    size: usize,
}

impl Categorical {
    /// Create a categorical distribution from a vector of probabilities.
    ///
    /// The probabilities are not required to be normalized; they are used as relative weights.
    ///
    /// # Errors
    /// If any probability is negative or non-finite, or if all are zero.
    pub fn new(probs: ArrayView1<f64>) -> Result<Self, CategoricalError> {
        if let Some(&p) = probs.iter().find(|p| !p.is_finite()) {
            return Err(CategoricalError::NonFinite(p));
        }
        Ok(Self {
            weights: WeightedIndex::new(probs.iter())?,
            size: probs.len(),
        })
    }

    /// Number of categories.
    pub const fn size(&self) -> usize {
        self.size
    }
}

impl Distribution<usize> for Categorical {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.weights.sample(rng)
    }
}

/// Error constructing a [`Categorical`] distribution.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CategoricalError {
    #[error("non-finite probability {0}")]
    NonFinite(f64),
    #[error("invalid probability weights")]
    Weights(#[from] WeightedError),
}

/// One-hot encoding of `index` as a vector of length `size`.
///
/// # Panics
/// If `index >= size`.
pub fn one_hot(index: usize, size: usize) -> Array1<f64> {
    assert!(index < size, "index {} out of range for size {}", index, size);
    let mut v = Array1::zeros(size);
    v[index] = 1.0;
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Prng;
    use ndarray::arr1;
    use rand::SeedableRng;
    use rstest::rstest;

    #[test]
    fn categorical_sample_frequencies() {
        let probs = arr1(&[0.2, 0.8]);
        let dist = Categorical::new(probs.view()).unwrap();
        let mut rng = Prng::seed_from_u64(1);
        let num_samples = 10_000;
        let ones = (0..num_samples)
            .filter(|_| dist.sample(&mut rng) == 1)
            .count();
        let freq = ones as f64 / num_samples as f64;
        assert!((freq - 0.8).abs() < 0.03, "frequency {}", freq);
    }

    #[test]
    fn categorical_never_samples_zero_probability() {
        let dist = Categorical::new(arr1(&[0.0, 1.0, 0.0]).view()).unwrap();
        let mut rng = Prng::seed_from_u64(2);
        assert!((0..1000).all(|_| dist.sample(&mut rng) == 1));
        assert_eq!(dist.size(), 3);
    }

    #[rstest]
    #[case(arr1(&[f64::NAN, 1.0]))]
    #[case(arr1(&[f64::INFINITY, 1.0]))]
    fn categorical_rejects_non_finite(#[case] probs: Array1<f64>) {
        assert!(matches!(
            Categorical::new(probs.view()),
            Err(CategoricalError::NonFinite(_))
        ));
    }

    #[rstest]
    #[case(arr1(&[0.0, 0.0]))]
    #[case(arr1(&[-0.5, 1.5]))]
    fn categorical_rejects_invalid_weights(#[case] probs: Array1<f64>) {
        assert!(matches!(
            Categorical::new(probs.view()),
            Err(CategoricalError::Weights(_))
        ));
    }

    #[test]
    fn one_hot_sets_single_entry() {
        assert_eq!(one_hot(1, 3), arr1(&[0.0, 1.0, 0.0]));
    }

    #[test]
    #[should_panic]
    fn one_hot_out_of_range() {
        let _ = one_hot(2, 2);
    }
}
