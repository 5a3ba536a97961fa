//! REINFORCE policy gradient for cart-pole balancing.
//!
//! A two-layer policy network is trained episode by episode:
//! each episode is collected in full with the current policy,
//! then the policy takes one gradient step per transition towards the discounted return.
#![warn(clippy::cast_lossless)]
#![warn(clippy::cast_possible_truncation)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::missing_const_for_fn)] // has some false positives
#![warn(clippy::needless_borrow)]
#![warn(clippy::needless_pass_by_value)]
#![warn(clippy::redundant_closure_for_method_calls)]
#![warn(clippy::use_self)] // also triggered by macro expansions
pub mod envs;
mod error;
pub mod logging;
pub mod policy;
pub mod simulation;
pub mod utils;

pub use envs::{EnvStep, Environment};
pub use error::{ConfigError, RLError};
pub use policy::{PolicyConfig, PolicyEstimator};
pub use simulation::{TrainConfig, TrainState, Trainer};

/// Pseudo-random number generator used throughout the crate.
pub type Prng = rand_chacha::ChaCha8Rng;
