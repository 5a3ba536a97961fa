//! Policy estimator
//!
//! A two-layer perceptron mapping an observation to a categorical distribution over actions,
//! trained with the REINFORCE policy gradient.
pub mod initializers;
pub mod optimizers;
mod params;

pub use initializers::{Initializer, InitializerError, VarianceScale};
pub use optimizers::{Adam, AdamConfig, BuildOptimizer, Optimizer, Sgd, SgdConfig};
pub use params::MlpParams;

use crate::error::ConfigError;
use crate::utils::distributions::Categorical;
use crate::Prng;
use ndarray::{Array1, Array2, ArrayView1, Zip};
use ndarray_stats::QuantileExt;
use rand::distributions::Distribution;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for [`PolicyEstimator`]
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig<OC = AdamConfig> {
    /// Number of hidden units.
    pub hidden_size: usize,
    /// Initializer for `w1` and `w2`.
    pub weight_initializer: Initializer,
    /// Initializer for `b1` and `b2`.
    pub bias_initializer: Initializer,
    /// Optimizer configuration.
    pub optimizer_config: OC,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            hidden_size: 12,
            weight_initializer: Initializer::default(),
            bias_initializer: Initializer::Zeros,
            optimizer_config: AdamConfig {
                learning_rate: 4e-4,
                ..AdamConfig::default()
            },
        }
    }
}

impl<OC: BuildOptimizer> PolicyConfig<OC> {
    /// Build a policy estimator with freshly initialized parameters.
    ///
    /// # Args
    /// * `observation_dimension` - Length of the observation vectors.
    /// * `action_count`          - Number of discrete actions.
    /// * `rng`                   - Random number generator for parameter initialization.
    pub fn build_policy<R: Rng + ?Sized>(
        &self,
        observation_dimension: usize,
        action_count: usize,
        rng: &mut R,
    ) -> Result<PolicyEstimator<OC::Optimizer>, PolicyError> {
        let hidden_size = self.hidden_size;
        if hidden_size == 0 {
            return Err(ConfigError::EmptyHiddenLayer.into());
        }
        let (w, b) = (&self.weight_initializer, &self.bias_initializer);
        let params = MlpParams {
            w1: w.array(
                (observation_dimension, hidden_size),
                observation_dimension,
                hidden_size,
                rng,
            )?,
            b1: b.array(hidden_size, observation_dimension, hidden_size, rng)?,
            w2: w.array(
                (hidden_size, action_count),
                hidden_size,
                action_count,
                rng,
            )?,
            b2: b.array(action_count, hidden_size, action_count, rng)?,
        };
        let optimizer = self.optimizer_config.build_optimizer(&params)?;
        Ok(PolicyEstimator { params, optimizer })
    }
}

/// Policy estimator error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PolicyError {
    #[error("{what} has length {actual} but expected {expected}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("non-finite values in {0}")]
    NumericalInstability(&'static str),
    #[error("invalid policy configuration")]
    Config(#[from] ConfigError),
    #[error("failed to initialize parameters")]
    Initializer(#[from] InitializerError),
}

/// Intermediate values of a forward pass.
struct Forward {
    /// Hidden layer pre-activations `x · w1 + b1`.
    pre_hidden: Array1<f64>,
    /// Hidden layer activations.
    hidden: Array1<f64>,
    /// Unnormalized action log probabilities.
    logits: Array1<f64>,
}

/// Stochastic policy over discrete actions.
///
/// `probabilities = softmax(relu(x · w1 + b1) · w2 + b2)`
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyEstimator<O = Adam> {
    params: MlpParams,
    optimizer: O,
}

impl PolicyEstimator<Adam> {
    /// Initialize a policy with Glorot-uniform weights, zero biases and an Adam optimizer.
    ///
    /// Deterministic given the seed.
    pub fn initialize(
        observation_dimension: usize,
        action_count: usize,
        hidden_size: usize,
        learning_rate: f64,
        seed: u64,
    ) -> Result<Self, PolicyError> {
        let defaults = PolicyConfig::default();
        let config = PolicyConfig {
            hidden_size,
            optimizer_config: AdamConfig {
                learning_rate,
                ..defaults.optimizer_config
            },
            ..defaults
        };
        config.build_policy(
            observation_dimension,
            action_count,
            &mut Prng::seed_from_u64(seed),
        )
    }
}

impl<O> PolicyEstimator<O> {
    pub fn observation_dimension(&self) -> usize {
        self.params.input_dim()
    }

    pub fn action_count(&self) -> usize {
        self.params.output_dim()
    }

    pub fn hidden_size(&self) -> usize {
        self.params.hidden_size()
    }

    /// The current parameters.
    pub const fn parameters(&self) -> &MlpParams {
        &self.params
    }

    /// Action probabilities for an observation.
    ///
    /// # Errors
    /// * [`PolicyError::DimensionMismatch`] if the observation has the wrong length.
    /// * [`PolicyError::NumericalInstability`] if the probabilities are not finite.
    pub fn predict(&self, observation: ArrayView1<f64>) -> Result<Array1<f64>, PolicyError> {
        self.check_observation(observation)?;
        let forward = self.forward(observation);
        let probs = softmax(&forward.logits);
        if !all_finite(&probs) {
            return Err(PolicyError::NumericalInstability("action probabilities"));
        }
        Ok(probs)
    }

    /// Sample an action index from the policy distribution.
    pub fn sample_action<R: Rng + ?Sized>(
        &self,
        observation: ArrayView1<f64>,
        rng: &mut R,
    ) -> Result<usize, PolicyError> {
        let probs = self.predict(observation)?;
        let dist = Categorical::new(probs.view())
            .map_err(|_| PolicyError::NumericalInstability("action probabilities"))?;
        Ok(dist.sample(rng))
    }

    /// The most probable action.
    pub fn greedy_action(&self, observation: ArrayView1<f64>) -> Result<usize, PolicyError> {
        let probs = self.predict(observation)?;
        probs
            .argmax()
            .map_err(|_| PolicyError::NumericalInstability("action probabilities"))
    }

    /// Check that the policy fits an environment with the given dimensions.
    ///
    /// # Errors
    /// [`PolicyError::DimensionMismatch`] if either dimension differs from the policy's.
    pub fn check_dimensions(
        &self,
        observation_dimension: usize,
        action_count: usize,
    ) -> Result<(), PolicyError> {
        check_len(
            "observation",
            observation_dimension,
            self.observation_dimension(),
        )?;
        check_len("action count", action_count, self.action_count())
    }

    fn check_observation(&self, observation: ArrayView1<f64>) -> Result<(), PolicyError> {
        check_len("observation", self.observation_dimension(), observation.len())
    }

    fn forward(&self, observation: ArrayView1<f64>) -> Forward {
        let p = &self.params;
        let pre_hidden = observation.dot(&p.w1) + &p.b1;
        let hidden = pre_hidden.mapv(relu);
        let logits = hidden.dot(&p.w2) + &p.b2;
        Forward {
            pre_hidden,
            hidden,
            logits,
        }
    }

    /// Loss and parameter gradients for one transition.
    ///
    /// `loss = return_value * cross_entropy(softmax(logits), action_one_hot)`
    fn loss_and_gradients(
        &self,
        observation: ArrayView1<f64>,
        action_one_hot: ArrayView1<f64>,
        return_value: f64,
    ) -> (f64, MlpParams) {
        let Forward {
            pre_hidden,
            hidden,
            logits,
        } = self.forward(observation);
        let log_probs = log_softmax(&logits);
        let probs = log_probs.mapv(f64::exp);
        let loss = -action_one_hot.dot(&log_probs) * return_value;

        // d(loss)/d(logits) for cross entropy with (possibly unnormalized) targets
        let target_mass = action_one_hot.sum();
        let grad_logits = (&probs * target_mass - &action_one_hot) * return_value;

        let grad_w2 = outer(hidden.view(), grad_logits.view());
        let grad_hidden = self.params.w2.dot(&grad_logits);
        let grad_pre_hidden = Zip::from(&grad_hidden)
            .and(&pre_hidden)
            .map_collect(|&g, &z| if z > 0.0 { g } else { 0.0 });
        let grad_w1 = outer(observation, grad_pre_hidden.view());

        let grads = MlpParams {
            w1: grad_w1,
            b1: grad_pre_hidden,
            w2: grad_w2,
            b2: grad_logits,
        };
        (loss, grads)
    }
}

impl<O: Optimizer> PolicyEstimator<O> {
    /// Take one policy gradient step on a single transition.
    ///
    /// Minimizes `return_value * cross_entropy(softmax(logits), action_one_hot)`,
    /// which increases the probability of the action when `return_value` is positive.
    ///
    /// # Returns
    /// The loss before the update.
    ///
    /// # Errors
    /// * [`PolicyError::DimensionMismatch`] if the observation or the action has the wrong length.
    /// * [`PolicyError::NumericalInstability`] if the loss or gradients are not finite.
    ///   The parameters are left unchanged.
    pub fn update(
        &mut self,
        observation: ArrayView1<f64>,
        action_one_hot: ArrayView1<f64>,
        return_value: f64,
    ) -> Result<f64, PolicyError> {
        self.check_observation(observation)?;
        check_len("action one-hot", self.action_count(), action_one_hot.len())?;

        let (loss, grads) = self.loss_and_gradients(observation, action_one_hot, return_value);
        if !loss.is_finite() {
            return Err(PolicyError::NumericalInstability("policy loss"));
        }
        if !grads.is_finite() {
            return Err(PolicyError::NumericalInstability("policy gradient"));
        }
        self.optimizer.step(&mut self.params, &grads);
        Ok(loss)
    }
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), PolicyError> {
    if expected == actual {
        Ok(())
    } else {
        Err(PolicyError::DimensionMismatch {
            what,
            expected,
            actual,
        })
    }
}

fn all_finite(x: &Array1<f64>) -> bool {
    x.iter().all(|v| v.is_finite())
}

/// Rectified linear unit; propagates `NaN`.
fn relu(x: f64) -> f64 {
    if x < 0.0 {
        0.0
    } else {
        x
    }
}

/// Numerically stable log-softmax.
fn log_softmax(logits: &Array1<f64>) -> Array1<f64> {
    let max = logits.fold(f64::NEG_INFINITY, |m, &x| m.max(x));
    let shifted = logits - max;
    let log_sum_exp = shifted.mapv(f64::exp).sum().ln();
    shifted - log_sum_exp
}

fn softmax(logits: &Array1<f64>) -> Array1<f64> {
    let max = logits.fold(f64::NEG_INFINITY, |m, &x| m.max(x));
    let exp = logits.mapv(|x| (x - max).exp());
    let total = exp.sum();
    exp / total
}

/// Outer product `a bᵀ`.
fn outer(a: ArrayView1<f64>, b: ArrayView1<f64>) -> Array2<f64> {
    Array2::from_shape_fn((a.len(), b.len()), |(i, j)| a[i] * b[j])
}
