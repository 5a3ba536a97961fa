//! Parameter initializers
#![allow(clippy::use_self)] // false positive with serde derives
use ndarray::{Array, Dimension, ShapeBuilder};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Array initializers.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum Initializer {
    /// Initialize to all zeros
    Zeros,
    /// Initialize all elements to the given constant value.
    Constant(f64),
    /// Uniform distribution with variance scaled by the layer dimensions.
    Uniform(VarianceScale),
    /// Normal distribution with variance scaled by the layer dimensions.
    Normal(VarianceScale),
}

/// Defaults to `Uniform(FanAvg)` a.k.a. Glorot or Xavier initialization.
///
/// This samples from `Unif(±√(6 / (fan_in + fan_out)))`.
impl Default for Initializer {
    fn default() -> Self {
        Self::Uniform(VarianceScale::FanAvg)
    }
}

/// Variance scaling mode.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum VarianceScale {
    /// The initializer sampling variance is set to the given constant.
    Constant(f64),
    /// Scale based on the number of input features.
    ///
    /// The initializer sampling variance is set to `1 / fan_in`.
    ///
    /// Also known as Kaiming or He initialization.
    FanIn,
    /// Scale based on the number of output features.
    ///
    /// The initializer sampling variance is set to `1 / fan_out`.
    FanOut,
    /// Scale based on the average number of input and output features.
    ///
    /// The initializer sampling variance is set to `2 / (fan_in + fan_out)`.
    ///
    /// Also known as Xavier or Glorot initialization.
    FanAvg,
}

impl Default for VarianceScale {
    fn default() -> Self {
        Self::FanIn
    }
}

impl VarianceScale {
    /// Element sampling variance for a layer with the given number of inputs and outputs.
    #[allow(clippy::cast_precision_loss)]
    pub fn variance(self, fan_in: usize, fan_out: usize) -> f64 {
        match self {
            Self::Constant(v) => v,
            Self::FanIn => (fan_in as f64).recip(),
            Self::FanOut => (fan_out as f64).recip(),
            Self::FanAvg => 2.0 / (fan_in as f64 + fan_out as f64),
        }
    }
}

impl Initializer {
    /// Create a new array using this initializer.
    ///
    /// # Args
    /// * `shape`   - Shape of the array to create.
    /// * `fan_in`  - Number of input features of the layer the array belongs to.
    /// * `fan_out` - Number of output features of the layer the array belongs to.
    /// * `rng`     - Random number generator for the random initializers.
    ///
    /// # Errors
    /// If the scaled variance is negative or not finite.
    pub fn array<Sh, D, R>(
        &self,
        shape: Sh,
        fan_in: usize,
        fan_out: usize,
        rng: &mut R,
    ) -> Result<Array<f64, D>, InitializerError>
    where
        Sh: ShapeBuilder<Dim = D>,
        D: Dimension,
        R: Rng + ?Sized,
    {
        match self {
            Self::Zeros => Ok(Array::zeros(shape)),
            Self::Constant(value) => Ok(Array::from_elem(shape, *value)),
            Self::Uniform(scale) => {
                let variance = checked_variance(*scale, fan_in, fan_out)?;
                // Unif[-a, a] has variance a^2 / 3
                let limit = (3.0 * variance).sqrt();
                let dist = Uniform::new_inclusive(-limit, limit);
                Ok(Array::from_shape_simple_fn(shape, || dist.sample(&mut *rng)))
            }
            Self::Normal(scale) => {
                let variance = checked_variance(*scale, fan_in, fan_out)?;
                let dist = Normal::new(0.0, variance.sqrt())
                    .map_err(|_| InitializerError::InvalidVariance(variance))?;
                Ok(Array::from_shape_simple_fn(shape, || dist.sample(&mut *rng)))
            }
        }
    }
}

fn checked_variance(
    scale: VarianceScale,
    fan_in: usize,
    fan_out: usize,
) -> Result<f64, InitializerError> {
    let variance = scale.variance(fan_in, fan_out);
    if variance.is_finite() && variance >= 0.0 {
        Ok(variance)
    } else {
        Err(InitializerError::InvalidVariance(variance))
    }
}

/// Error initializing an array.
#[derive(Debug, Error, Copy, Clone, PartialEq)]
pub enum InitializerError {
    #[error("initializer variance must be finite and non-negative, got {0}")]
    InvalidVariance(f64),
}
