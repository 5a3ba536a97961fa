//! Error type
use crate::envs::EnvError;
use crate::logging::LogError;
use crate::policy::PolicyError;
use thiserror::Error;

/// Error from the REINFORCE crate.
#[derive(Error, Debug)]
pub enum RLError {
    #[error("policy error")]
    Policy(#[from] PolicyError),
    #[error("environment failure")]
    Environment(#[from] EnvError),
    #[error("invalid configuration")]
    Config(#[from] ConfigError),
    #[error("logging error")]
    Log(#[from] LogError),
}

/// A configuration value outside of its valid domain.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("discount factor must be in (0, 1], got {0}")]
    DiscountFactor(f64),
    #[error("rolling window must be at least 1")]
    EmptyWindow,
    #[error("hidden layer size must be at least 1")]
    EmptyHiddenLayer,
    #[error("learning rate must be positive and finite, got {0}")]
    LearningRate(f64),
}
