//! Simulation and training
//!
//! Episodes are collected in full with the current policy before any update.
mod episode;
mod monitor;
mod returns;
mod train;

pub use episode::{collect_episode, ActorMode, Episode, Transition};
pub use monitor::{ConvergenceMonitor, EpisodeReport, RewardLog, TrainState};
pub use returns::{check_discount_factor, compute_returns, discounted_returns};
pub use train::{TrainConfig, TrainSummary, Trainer};
