//! Reinforcement learning environments
mod cartpole;
#[cfg(test)]
pub mod testing;

pub use cartpole::{
    CartPole, CartPoleConfig, CartPoleInfo, CartPoleState, EnvironmentParams, PhysicalConstants,
};

use ndarray::Array1;
use std::error::Error;
use thiserror::Error;

/// Result of a single environment step.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvStep<I = ()> {
    /// Observation of the resulting state.
    pub observation: Array1<f64>,
    /// Reward for this transition.
    pub reward: f64,
    /// Whether this step ends the episode.
    ///
    /// An episode may end because the state is terminal or because of a step limit.
    pub done: bool,
    /// Environment-specific diagnostic information. Not used for learning.
    pub info: I,
}

/// A reinforcement learning environment with internal state.
///
/// Observations are real vectors of length [`observation_dimension`](Self::observation_dimension)
/// and actions are indices in `0 .. action_count`.
pub trait Environment {
    /// Opaque per-step diagnostic information.
    type Info;

    /// Length of every observation vector.
    fn observation_dimension(&self) -> usize;

    /// Number of discrete actions.
    fn action_count(&self) -> usize;

    /// Reset the environment to an initial state.
    ///
    /// Must be called before each new episode.
    ///
    /// # Returns
    /// An observation of the initial state.
    fn reset(&mut self) -> Result<Array1<f64>, EnvError>;

    /// Take a step in the environment.
    ///
    /// Fails if the environment has not been reset since the last step with `done = true`.
    fn step(&mut self, action: usize) -> Result<EnvStep<Self::Info>, EnvError>;

    /// Display the current state.
    ///
    /// Has no effect on the environment dynamics.
    fn render(&mut self) -> Result<(), EnvError> {
        Ok(())
    }
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    type Info = E::Info;

    fn observation_dimension(&self) -> usize {
        E::observation_dimension(self)
    }
    fn action_count(&self) -> usize {
        E::action_count(self)
    }
    fn reset(&mut self) -> Result<Array1<f64>, EnvError> {
        E::reset(self)
    }
    fn step(&mut self, action: usize) -> Result<EnvStep<Self::Info>, EnvError> {
        E::step(self, action)
    }
    fn render(&mut self) -> Result<(), EnvError> {
        E::render(self)
    }
}

/// Error raised by an environment on reset, step, or render.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("step called without an active episode; call reset first")]
    NotReset,
    #[error("action {action} is out of range for {action_count} actions")]
    InvalidAction { action: usize, action_count: usize },
    #[error("environment backend failed")]
    Backend(#[source] Box<dyn Error + Send + Sync>),
}
