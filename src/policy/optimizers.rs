//! Optimizers
use super::MlpParams;
use crate::error::ConfigError;
use ndarray::Zip;
use serde::{Deserialize, Serialize};

/// Optimizer that minimizes a loss given its gradient.
pub trait Optimizer {
    /// Take one loss minimization step.
    ///
    /// # Args
    /// * `params` - Parameters to update in place.
    /// * `grads`  - Gradient of the loss with respect to each parameter.
    ///              Must have the same dimensions as `params`.
    fn step(&mut self, params: &mut MlpParams, grads: &MlpParams);
}

/// Build an [`Optimizer`] for a set of parameters.
pub trait BuildOptimizer {
    type Optimizer: Optimizer;

    /// Build an optimizer for parameters with the dimensions of `params`.
    ///
    /// # Errors
    /// If the configuration is invalid.
    fn build_optimizer(&self, params: &MlpParams) -> Result<Self::Optimizer, ConfigError>;
}

fn check_learning_rate(learning_rate: f64) -> Result<(), ConfigError> {
    if learning_rate.is_finite() && learning_rate > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::LearningRate(learning_rate))
    }
}

/// Configuration for the SGD optimizer.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct SgdConfig {
    /// Learning rate
    pub learning_rate: f64,
}

impl Default for SgdConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-2,
        }
    }
}

impl BuildOptimizer for SgdConfig {
    type Optimizer = Sgd;

    fn build_optimizer(&self, _: &MlpParams) -> Result<Sgd, ConfigError> {
        check_learning_rate(self.learning_rate)?;
        Ok(Sgd { config: *self })
    }
}

/// Stochastic gradient descent without momentum.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sgd {
    config: SgdConfig,
}

impl Optimizer for Sgd {
    fn step(&mut self, params: &mut MlpParams, grads: &MlpParams) {
        let learning_rate = self.config.learning_rate;
        for (param, grad) in params.views_mut().into_iter().zip(grads.views()) {
            Zip::from(param)
                .and(&grad)
                .for_each(|p, &g| *p -= learning_rate * g);
        }
    }
}

/// Configuration for the Adam optimizer.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdamConfig {
    /// Learning rate
    pub learning_rate: f64,
    /// Coefficient for the running average of the gradient
    pub beta1: f64,
    /// Coefficient for the running average of the square of the gradient
    pub beta2: f64,
    /// Added to the denominator for numerical stability
    pub epsilon: f64,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }
}

impl BuildOptimizer for AdamConfig {
    type Optimizer = Adam;

    fn build_optimizer(&self, params: &MlpParams) -> Result<Adam, ConfigError> {
        check_learning_rate(self.learning_rate)?;
        Ok(Adam {
            config: *self,
            first_moment: params.zeros_like(),
            second_moment: params.zeros_like(),
            num_steps: 0,
        })
    }
}

/// Adam optimizer.
///
/// Keeps exponential moving averages of the gradient and the squared gradient
/// and steps along their bias-corrected ratio.
/// Uses the `ε̂` formulation of [Kingma & Ba (2015)][adam] section 2:
/// the bias correction is folded into the step size.
///
/// [adam]: https://arxiv.org/abs/1412.6980
#[derive(Debug, Clone, PartialEq)]
pub struct Adam {
    config: AdamConfig,
    first_moment: MlpParams,
    second_moment: MlpParams,
    num_steps: u64,
}

impl Adam {
    /// Number of steps taken so far.
    pub const fn num_steps(&self) -> u64 {
        self.num_steps
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut MlpParams, grads: &MlpParams) {
        let AdamConfig {
            learning_rate,
            beta1,
            beta2,
            epsilon,
        } = self.config;
        self.num_steps += 1;
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let t = self.num_steps.min(i32::MAX as u64) as i32;
        let step_size = learning_rate * (1.0 - beta2.powi(t)).sqrt() / (1.0 - beta1.powi(t));

        let moments = self
            .first_moment
            .views_mut()
            .into_iter()
            .zip(self.second_moment.views_mut());
        for ((param, grad), (m, v)) in params.views_mut().into_iter().zip(grads.views()).zip(moments)
        {
            Zip::from(param)
                .and(&grad)
                .and(m)
                .and(v)
                .for_each(|p, &g, m, v| {
                    *m = beta1 * *m + (1.0 - beta1) * g;
                    *v = beta2 * *v + (1.0 - beta2) * g * g;
                    *p -= step_size * *m / (v.sqrt() + epsilon);
                });
        }
    }
}
