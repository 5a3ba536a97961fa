//! Episode collection
use crate::envs::Environment;
use crate::policy::PolicyEstimator;
use crate::utils::distributions::one_hot;
use crate::RLError;
use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::iter::FromIterator;
use std::slice;

/// How actions are chosen from the policy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorMode {
    /// Sample actions from the policy distribution.
    Training,
    /// Always take the most probable action.
    Evaluation,
}

/// A single environment transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Observation before the action.
    pub state: Array1<f64>,
    /// One-hot encoding of the action taken.
    pub action: Array1<f64>,
    /// Reward for this transition.
    pub reward: f64,
    /// Observation after the action.
    pub next_state: Array1<f64>,
    /// Whether the episode ended with this transition.
    pub done: bool,
}

/// The transitions of one episode, in order.
///
/// Only the last transition may have `done` set.
/// An episode cut short by a step limit has no `done` transition.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Episode {
    transitions: Vec<Transition>,
    total_reward: f64,
}

impl Episode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transition.
    ///
    /// # Panics
    /// If the episode already has a `done` transition.
    pub fn push(&mut self, transition: Transition) {
        assert!(!self.is_done(), "episode is already done");
        self.total_reward += transition.reward;
        self.transitions.push(transition);
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn iter(&self) -> slice::Iter<'_, Transition> {
        self.transitions.iter()
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Sum of the rewards of every transition.
    pub const fn total_reward(&self) -> f64 {
        self.total_reward
    }

    /// Whether the episode ended on a `done` transition.
    pub fn is_done(&self) -> bool {
        self.transitions.last().map_or(false, |t| t.done)
    }

    pub fn rewards(&self) -> impl Iterator<Item = f64> + '_ {
        self.transitions.iter().map(|t| t.reward)
    }
}

impl FromIterator<Transition> for Episode {
    fn from_iter<I: IntoIterator<Item = Transition>>(iter: I) -> Self {
        let mut episode = Self::new();
        for transition in iter {
            episode.push(transition);
        }
        episode
    }
}

impl<'a> IntoIterator for &'a Episode {
    type Item = &'a Transition;
    type IntoIter = slice::Iter<'a, Transition>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Run one episode of `policy` in `environment`.
///
/// The environment is reset, then stepped until it reports `done` or `max_steps` steps are taken.
///
/// # Args
/// * `policy`      - Policy used to choose actions. Not modified.
/// * `environment` - Environment to simulate.
/// * `max_steps`   - Maximum number of steps in the episode.
/// * `mode`        - Sample actions (`Training`) or act greedily (`Evaluation`).
/// * `render`      - Render the environment after every step.
/// * `rng`         - Random number generator for action sampling.
///
/// # Errors
/// [`PolicyError::DimensionMismatch`](crate::policy::PolicyError::DimensionMismatch)
/// if the policy does not fit the environment.
/// Environment and policy errors are returned immediately; the partial episode is discarded.
pub fn collect_episode<E, O, R>(
    policy: &PolicyEstimator<O>,
    environment: &mut E,
    max_steps: usize,
    mode: ActorMode,
    render: bool,
    rng: &mut R,
) -> Result<Episode, RLError>
where
    E: Environment + ?Sized,
    R: Rng + ?Sized,
{
    let action_count = environment.action_count();
    policy.check_dimensions(environment.observation_dimension(), action_count)?;
    let mut episode = Episode::new();
    let mut state = environment.reset()?;
    for _ in 0..max_steps {
        let action = match mode {
            ActorMode::Training => policy.sample_action(state.view(), &mut *rng)?,
            ActorMode::Evaluation => policy.greedy_action(state.view())?,
        };
        let step = environment.step(action)?;
        if render {
            environment.render()?;
        }
        let done = step.done;
        episode.push(Transition {
            state,
            action: one_hot(action, action_count),
            reward: step.reward,
            next_state: step.observation.clone(),
            done,
        });
        if done {
            break;
        }
        state = step.observation;
    }
    Ok(episode)
}
