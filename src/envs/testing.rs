//! Environment testing utilities
use super::{EnvError, EnvStep, Environment};
use crate::Prng;
use ndarray::Array1;
use rand::{Rng, SeedableRng};

/// Run an environment with uniform random actions and check that invariants are satisfied.
pub fn check_env<E: Environment>(env: &mut E, mut num_steps: u64, seed: u64) {
    let mut rng = Prng::seed_from_u64(seed);
    let action_count = env.action_count();

    let mut obs = env.reset().unwrap();
    while num_steps > 0 {
        assert_eq!(obs.len(), env.observation_dimension());
        let action = rng.gen_range(0..action_count);
        assert!(action < action_count);
        let step = env.step(action).unwrap();
        assert!(step.reward.is_finite());
        obs = if step.done {
            env.reset().unwrap()
        } else {
            step.observation
        };
        num_steps -= 1;
    }
}

/// Environment with a deterministic observation sequence and scripted rewards.
///
/// The episode ends (`done = true`) after the last reward unless `never_done` is set,
/// in which case the rewards repeat forever.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedEnv {
    pub observation_dimension: usize,
    pub action_count: usize,
    pub rewards: Vec<f64>,
    pub never_done: bool,
    pub resets: usize,
    pub renders: usize,
    position: Option<usize>,
}

impl ScriptedEnv {
    pub fn new(observation_dimension: usize, action_count: usize, rewards: Vec<f64>) -> Self {
        Self {
            observation_dimension,
            action_count,
            rewards,
            never_done: false,
            resets: 0,
            renders: 0,
            position: None,
        }
    }

    /// An episode of `len` steps each with reward `1`.
    pub fn constant(len: usize) -> Self {
        Self::new(4, 2, vec![1.0; len])
    }

    fn observation(&self, position: usize) -> Array1<f64> {
        #[allow(clippy::cast_precision_loss)]
        let t = position as f64;
        Array1::from_shape_fn(self.observation_dimension, |i| 0.01 * t - 0.02 * i as f64)
    }
}

impl Environment for ScriptedEnv {
    type Info = ();

    fn observation_dimension(&self) -> usize {
        self.observation_dimension
    }

    fn action_count(&self) -> usize {
        self.action_count
    }

    fn reset(&mut self) -> Result<Array1<f64>, EnvError> {
        self.resets += 1;
        self.position = Some(0);
        Ok(self.observation(0))
    }

    fn step(&mut self, action: usize) -> Result<EnvStep, EnvError> {
        if action >= self.action_count {
            return Err(EnvError::InvalidAction {
                action,
                action_count: self.action_count,
            });
        }
        let position = self.position.ok_or(EnvError::NotReset)?;
        let reward = self.rewards[position % self.rewards.len()];
        let next = position + 1;
        let done = !self.never_done && next >= self.rewards.len();
        self.position = if done { None } else { Some(next) };
        Ok(EnvStep {
            observation: self.observation(next),
            reward,
            done,
            info: (),
        })
    }

    fn render(&mut self) -> Result<(), EnvError> {
        self.renders += 1;
        Ok(())
    }
}

/// Environment that fails after a given number of successful steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailingEnv {
    pub steps_before_failure: usize,
    steps: usize,
}

impl FailingEnv {
    pub const fn new(steps_before_failure: usize) -> Self {
        Self {
            steps_before_failure,
            steps: 0,
        }
    }
}

impl Environment for FailingEnv {
    type Info = ();

    fn observation_dimension(&self) -> usize {
        4
    }

    fn action_count(&self) -> usize {
        2
    }

    fn reset(&mut self) -> Result<Array1<f64>, EnvError> {
        self.steps = 0;
        Ok(Array1::zeros(4))
    }

    fn step(&mut self, _action: usize) -> Result<EnvStep, EnvError> {
        if self.steps >= self.steps_before_failure {
            return Err(EnvError::Backend("simulator crashed".into()));
        }
        self.steps += 1;
        Ok(EnvStep {
            observation: Array1::zeros(4),
            reward: 1.0,
            done: false,
            info: (),
        })
    }
}
