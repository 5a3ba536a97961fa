use super::monitor::{ConvergenceMonitor, RewardLog, TrainState};
use super::returns::{check_discount_factor, compute_returns};
use super::{collect_episode, ActorMode};
use crate::envs::Environment;
use crate::logging::{Event, Loggable, Logger};
use crate::policy::{Adam, Optimizer, PolicyEstimator};
use crate::utils::stats::OnlineMeanVariance;
use crate::{Prng, RLError};
use serde::{Deserialize, Serialize};

/// Configuration for a REINFORCE [`Trainer`].
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Maximum number of training episodes.
    pub max_episodes: usize,
    /// Maximum number of steps in each episode.
    pub max_steps_per_episode: usize,
    /// Discount factor for the returns. Must be in `(0, 1]`.
    pub discount_factor: f64,
    /// Render the environment at every step.
    pub render: bool,
    /// Training is solved once the rolling average reward exceeds this value.
    pub success_threshold: f64,
    /// Number of episodes in the rolling average.
    pub rolling_window: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            max_episodes: 5000,
            max_steps_per_episode: 501,
            discount_factor: 0.99,
            render: false,
            success_threshold: 475.0,
            rolling_window: 100,
        }
    }
}

/// Summary of a finished training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainSummary {
    /// Final state; either `Solved` or `Exhausted`.
    pub state: TrainState,
    /// Number of episodes run.
    pub num_episodes: usize,
    /// Rolling average reward at the end of the run.
    pub rolling_average: f64,
    /// Total reward of every episode.
    pub rewards: RewardLog,
}

/// Trains a policy with REINFORCE.
///
/// Each episode is collected in full with the current policy,
/// then the policy is updated once per step towards the discounted return from that step.
#[derive(Debug, Clone)]
pub struct Trainer<E, O = Adam> {
    config: TrainConfig,
    policy: PolicyEstimator<O>,
    environment: E,
    monitor: ConvergenceMonitor,
    rng: Prng,
}

impl<E, O> Trainer<E, O>
where
    E: Environment,
    O: Optimizer,
{
    /// Create a new trainer.
    ///
    /// # Args
    /// * `config`      - Training configuration.
    /// * `policy`      - Policy to train.
    /// * `environment` - Environment to train in.
    /// * `rng`         - Random number generator for action sampling.
    ///
    /// # Errors
    /// If the configuration is invalid or the policy dimensions do not match the environment.
    pub fn new(
        config: TrainConfig,
        policy: PolicyEstimator<O>,
        environment: E,
        rng: Prng,
    ) -> Result<Self, RLError> {
        check_discount_factor(config.discount_factor)?;
        policy.check_dimensions(
            environment.observation_dimension(),
            environment.action_count(),
        )?;
        let monitor = ConvergenceMonitor::new(
            config.success_threshold,
            config.rolling_window,
            config.max_episodes,
        )?;
        Ok(Self {
            config,
            policy,
            environment,
            monitor,
            rng,
        })
    }

    pub const fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub const fn policy(&self) -> &PolicyEstimator<O> {
        &self.policy
    }

    pub fn environment_mut(&mut self) -> &mut E {
        &mut self.environment
    }

    pub const fn monitor(&self) -> &ConvergenceMonitor {
        &self.monitor
    }

    pub const fn state(&self) -> TrainState {
        self.monitor.state()
    }

    /// Consume the trainer, returning the policy and the environment.
    pub fn into_inner(self) -> (PolicyEstimator<O>, E) {
        (self.policy, self.environment)
    }

    /// Run one training episode.
    ///
    /// Collects an episode and records its total reward.
    /// If that solves the task, the run stops without updating the policy.
    /// Otherwise the policy is updated on every transition in order.
    ///
    /// Does nothing if the run is already in a terminal state.
    ///
    /// # Returns
    /// The training state after the episode.
    pub fn step_episode<L: Logger + ?Sized>(
        &mut self,
        logger: &mut L,
    ) -> Result<TrainState, RLError> {
        if self.monitor.state().is_terminal() {
            return Ok(self.monitor.state());
        }
        let episode = collect_episode(
            &self.policy,
            &mut self.environment,
            self.config.max_steps_per_episode,
            ActorMode::Training,
            self.config.render,
            &mut self.rng,
        )?;
        let report = self.monitor.record(episode.total_reward());

        logger.log(Event::Episode, "episode", report.episode.into())?;
        logger.log(Event::Episode, "reward", report.reward.into())?;
        logger.log(
            Event::Episode,
            "average_reward",
            report.rolling_average.into(),
        )?;
        logger.log(
            Event::Episode,
            "rolling_window",
            self.monitor.rolling_window().into(),
        )?;
        logger.log(Event::Episode, "length", episode.len().into())?;

        if self.monitor.state().is_terminal() {
            logger.done(Event::Episode)?;
            return Ok(self.monitor.state());
        }

        let returns = compute_returns(&episode, self.config.discount_factor)?;
        let mut losses = OnlineMeanVariance::new();
        for (transition, return_) in episode.iter().zip(returns) {
            let loss = self
                .policy
                .update(transition.state.view(), transition.action.view(), return_)?;
            losses.push(loss);
        }
        let loss_mean = losses.mean().map_or(Loggable::Nothing, Loggable::Scalar);
        logger.log(Event::Episode, "loss_mean", loss_mean)?;
        logger.done(Event::Episode)?;

        Ok(self.monitor.end_episode())
    }

    /// Train until solved or out of episodes.
    pub fn run<L: Logger + ?Sized>(&mut self, logger: &mut L) -> Result<TrainSummary, RLError> {
        let mut state = self.monitor.state();
        while !state.is_terminal() {
            state = self.step_episode(logger)?;
        }
        match state {
            TrainState::Solved { episode } => {
                logger.log(Event::Run, "solved_at", episode.into())?;
            }
            _ => {
                logger.log(
                    Event::Run,
                    "exhausted_after",
                    self.monitor.num_episodes().into(),
                )?;
            }
        }
        logger.done(Event::Run)?;

        Ok(TrainSummary {
            state,
            num_episodes: self.monitor.num_episodes(),
            rolling_average: self.monitor.rolling_average(),
            rewards: self.monitor.rewards().clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::testing::{FailingEnv, ScriptedEnv};
    use crate::envs::{CartPoleConfig, EnvError};
    use crate::error::ConfigError;
    use crate::logging::MemoryLogger;
    use crate::policy::PolicyError;
    use rand::SeedableRng;
    use rstest::rstest;

    fn policy() -> PolicyEstimator {
        PolicyEstimator::initialize(4, 2, 12, 4e-4, 0).unwrap()
    }

    fn trainer<E: Environment>(config: TrainConfig, env: E) -> Trainer<E> {
        Trainer::new(config, policy(), env, Prng::seed_from_u64(1)).unwrap()
    }

    #[test]
    fn default_config() {
        let config = TrainConfig::default();
        assert_eq!(config.max_episodes, 5000);
        assert_eq!(config.max_steps_per_episode, 501);
        assert!((config.discount_factor - 0.99).abs() < 1e-12);
        assert!(!config.render);
        assert!((config.success_threshold - 475.0).abs() < 1e-12);
        assert_eq!(config.rolling_window, 100);
    }

    #[test]
    fn solved_when_average_exceeds_threshold() {
        // Every episode is a single step with reward 500
        let mut trainer = trainer(TrainConfig::default(), ScriptedEnv::new(4, 2, vec![500.0]));
        let mut logger = MemoryLogger::new();
        let summary = trainer.run(&mut logger).unwrap();

        assert_eq!(summary.state, TrainState::Solved { episode: 99 });
        assert_eq!(summary.num_episodes, 100);
        assert!((summary.rolling_average - 500.0).abs() < 1e-9);
        assert_eq!(
            logger.values(Event::Run, "solved_at").collect::<Vec<_>>(),
            vec![Loggable::Index(99)]
        );
        // The solving episode is not used for an update
        assert_eq!(logger.values(Event::Episode, "loss_mean").count(), 99);
        assert_eq!(logger.values(Event::Episode, "reward").count(), 100);
    }

    #[test]
    fn solving_episode_does_not_update_policy() {
        let config = TrainConfig {
            rolling_window: 1,
            ..TrainConfig::default()
        };
        let mut trainer = trainer(config, ScriptedEnv::new(4, 2, vec![500.0]));
        let before = trainer.policy().parameters().clone();
        let state = trainer.step_episode(&mut ()).unwrap();
        assert_eq!(state, TrainState::Solved { episode: 0 });
        assert_eq!(trainer.policy().parameters(), &before);
    }

    #[test]
    fn exhausted_after_max_episodes() {
        let config = TrainConfig {
            max_episodes: 5000,
            ..TrainConfig::default()
        };
        let mut trainer = trainer(config, ScriptedEnv::new(4, 2, vec![10.0]));
        let summary = trainer.run(&mut ()).unwrap();
        assert_eq!(summary.state, TrainState::Exhausted);
        assert_eq!(summary.num_episodes, 5000);
        assert_eq!(summary.rewards.len(), 5000);
        assert!((summary.rolling_average - 10.0).abs() < 1e-9);
    }

    #[test]
    fn terminal_state_runs_no_more_episodes() {
        let config = TrainConfig {
            max_episodes: 2,
            ..TrainConfig::default()
        };
        let mut trainer = trainer(config, ScriptedEnv::constant(3));
        assert_eq!(trainer.step_episode(&mut ()).unwrap(), TrainState::Running);
        assert_eq!(trainer.step_episode(&mut ()).unwrap(), TrainState::Exhausted);
        assert_eq!(trainer.step_episode(&mut ()).unwrap(), TrainState::Exhausted);
        assert_eq!(trainer.monitor().num_episodes(), 2);
        let (_, env) = trainer.into_inner();
        assert_eq!(env.resets, 2);
    }

    #[test]
    fn logs_each_episode() {
        let config = TrainConfig {
            max_episodes: 3,
            ..TrainConfig::default()
        };
        let mut trainer = trainer(config, ScriptedEnv::constant(4));
        let mut logger = MemoryLogger::new();
        trainer.run(&mut logger).unwrap();

        assert_eq!(
            logger.values(Event::Episode, "episode").collect::<Vec<_>>(),
            vec![Loggable::Index(0), Loggable::Index(1), Loggable::Index(2)]
        );
        assert!(logger
            .values(Event::Episode, "reward")
            .all(|r| r == Loggable::Scalar(4.0)));
        assert!(logger
            .values(Event::Episode, "average_reward")
            .all(|r| r == Loggable::Scalar(0.0)));
        assert_eq!(
            logger.values(Event::Run, "exhausted_after").collect::<Vec<_>>(),
            vec![Loggable::Index(3)]
        );
        assert_eq!(
            logger.completed,
            vec![Event::Episode, Event::Episode, Event::Episode, Event::Run]
        );
    }

    #[test]
    fn updates_change_policy() {
        let config = TrainConfig {
            max_episodes: 1,
            ..TrainConfig::default()
        };
        let mut trainer = trainer(config, ScriptedEnv::constant(5));
        let before = trainer.policy().parameters().clone();
        trainer.run(&mut ()).unwrap();
        assert_ne!(trainer.policy().parameters(), &before);
        assert!(trainer.policy().parameters().is_finite());
    }

    #[test]
    fn same_seed_same_run() {
        let run = || {
            let config = TrainConfig {
                max_episodes: 5,
                ..TrainConfig::default()
            };
            let env = CartPoleConfig::default().build_env(7);
            let mut trainer = trainer(config, env);
            let summary = trainer.run(&mut ()).unwrap();
            (summary, trainer.policy().parameters().clone())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn environment_failure_propagates() {
        let mut trainer = trainer(TrainConfig::default(), FailingEnv::new(2));
        let result = trainer.run(&mut ());
        assert!(matches!(
            result,
            Err(RLError::Environment(EnvError::Backend(_)))
        ));
    }

    #[rstest]
    #[case(0.0)]
    #[case(1.5)]
    fn invalid_discount_factor(#[case] discount_factor: f64) {
        let config = TrainConfig {
            discount_factor,
            ..TrainConfig::default()
        };
        let result = Trainer::new(config, policy(), ScriptedEnv::constant(1), Prng::seed_from_u64(0));
        assert!(matches!(
            result,
            Err(RLError::Config(ConfigError::DiscountFactor(_)))
        ));
    }

    #[test]
    fn mismatched_environment_rejected() {
        let env = ScriptedEnv::new(4, 3, vec![1.0]);
        let result = Trainer::new(TrainConfig::default(), policy(), env, Prng::seed_from_u64(0));
        assert!(matches!(
            result,
            Err(RLError::Policy(PolicyError::DimensionMismatch { .. }))
        ));
    }

    #[test]
    fn cartpole_short_run() {
        let config = TrainConfig {
            max_episodes: 20,
            ..TrainConfig::default()
        };
        let env = CartPoleConfig::default().build_env(0);
        let mut trainer = trainer(config, env);
        let mut logger = MemoryLogger::new();
        let summary = trainer.run(&mut logger).unwrap();
        assert_eq!(summary.state, TrainState::Exhausted);
        assert!(summary
            .rewards
            .iter()
            .all(|&r| (1.0..=500.0).contains(&r)));
    }

    #[test]
    fn config_serde_round_trip() {
        let config = TrainConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: TrainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
