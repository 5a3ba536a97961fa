//! Convergence monitoring
use crate::error::ConfigError;
use crate::utils::stats::OnlineMeanVariance;
use std::ops::Deref;

/// State of a training run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TrainState {
    /// More episodes will be run.
    Running,
    /// The rolling average reward exceeded the success threshold at this episode index.
    Solved { episode: usize },
    /// The episode limit was reached without solving.
    Exhausted,
}

impl TrainState {
    /// Whether no further episodes will be run.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Append-only log of episode total rewards.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RewardLog(Vec<f64>);

impl RewardLog {
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, reward: f64) {
        self.0.push(reward);
    }

    /// Statistics of the most recent `n` rewards (or all of them if there are fewer).
    pub fn recent_stats(&self, n: usize) -> OnlineMeanVariance<f64> {
        let start = self.0.len().saturating_sub(n);
        self.0[start..].iter().copied().collect()
    }
}

impl Deref for RewardLog {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

/// Summary of one recorded episode.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EpisodeReport {
    /// Episode index, starting from 0.
    pub episode: usize,
    /// Total reward of the episode.
    pub reward: f64,
    /// Rolling average reward after this episode.
    pub rolling_average: f64,
}

/// Tracks episode rewards and decides when training stops.
///
/// The rolling average is the mean of the last `rolling_window` episode rewards.
/// It is only recomputed once at least `rolling_window` episodes have been recorded;
/// before that it keeps its initial value of `0`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceMonitor {
    success_threshold: f64,
    rolling_window: usize,
    max_episodes: usize,
    rewards: RewardLog,
    rolling_average: f64,
    state: TrainState,
}

impl ConvergenceMonitor {
    /// # Errors
    /// If `rolling_window` is zero.
    pub fn new(
        success_threshold: f64,
        rolling_window: usize,
        max_episodes: usize,
    ) -> Result<Self, ConfigError> {
        if rolling_window == 0 {
            return Err(ConfigError::EmptyWindow);
        }
        let state = if max_episodes == 0 {
            TrainState::Exhausted
        } else {
            TrainState::Running
        };
        Ok(Self {
            success_threshold,
            rolling_window,
            max_episodes,
            rewards: RewardLog::new(),
            rolling_average: 0.0,
            state,
        })
    }

    pub const fn state(&self) -> TrainState {
        self.state
    }

    pub const fn rolling_average(&self) -> f64 {
        self.rolling_average
    }

    pub const fn rolling_window(&self) -> usize {
        self.rolling_window
    }

    pub const fn rewards(&self) -> &RewardLog {
        &self.rewards
    }

    /// Number of episodes recorded.
    pub fn num_episodes(&self) -> usize {
        self.rewards.len()
    }

    /// Record the total reward of a completed episode.
    ///
    /// Transitions to [`TrainState::Solved`] if the rolling average exceeds the threshold.
    ///
    /// # Panics
    /// If the run is already in a terminal state.
    pub fn record(&mut self, reward: f64) -> EpisodeReport {
        assert!(!self.state.is_terminal(), "training run has already ended");
        let episode = self.rewards.len();
        self.rewards.push(reward);
        if episode + 1 >= self.rolling_window {
            if let Some(mean) = self.rewards.recent_stats(self.rolling_window).mean() {
                self.rolling_average = mean;
            }
        }
        if self.rolling_average > self.success_threshold {
            self.state = TrainState::Solved { episode };
        }
        EpisodeReport {
            episode,
            reward,
            rolling_average: self.rolling_average,
        }
    }

    /// Mark the end of the current episode's updates.
    ///
    /// Transitions to [`TrainState::Exhausted`] once `max_episodes` episodes have been recorded.
    pub fn end_episode(&mut self) -> TrainState {
        if self.state == TrainState::Running && self.rewards.len() >= self.max_episodes {
            self.state = TrainState::Exhausted;
        }
        self.state
    }
}
