use super::{EnvError, EnvStep, Environment};
use crate::Prng;
use ndarray::{arr1, Array1};
use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Configuration for the [`CartPole`] environment.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartPoleConfig {
    /// Physics configuration
    pub physics_config: PhysicalConstants,
    /// Environment episode configuration
    pub env_config: EnvironmentParams,
}

impl CartPoleConfig {
    /// Build a cart-pole environment whose initial states are sampled with the given seed.
    pub fn build_env(&self, seed: u64) -> CartPole {
        CartPole::new(self.physics_config, self.env_config, seed)
    }
}

/// Cart-Pole environment
///
/// Consists of a simulated cart on a frictionless track with a pole attached by a hinge on top.
/// The goal is to keep the pole upright by pushing the cart left (action `0`) or right
/// (action `1`). Every step, including the last, yields a reward of `1`.
///
/// The dynamics follow [Barto et al. (1983)][barto1983] with the explicit Euler integration
/// and the constants of the [OpenAI Gym CartPole-v1 environment][cartpole_source].
/// Observations are `[cart_position, cart_velocity, pole_angle, pole_angular_velocity]`.
///
/// [barto1983]: https://ieeexplore.ieee.org/document/6313077
/// [cartpole_source]: https://github.com/openai/gym/blob/master/gym/envs/classic_control/cartpole.py
#[derive(Debug, Clone, PartialEq)]
pub struct CartPole {
    phys: PhysicalConstants,
    env: EnvironmentParams,
    state: Option<CartPoleState>,
    steps: u64,
    rng: Prng,
}

impl CartPole {
    pub fn new(phys: PhysicalConstants, env: EnvironmentParams, seed: u64) -> Self {
        Self {
            phys,
            env,
            state: None,
            steps: 0,
            rng: Prng::seed_from_u64(seed),
        }
    }

    /// The current physical state; `None` between episodes.
    pub const fn state(&self) -> Option<&CartPoleState> {
        self.state.as_ref()
    }

    fn is_terminal(&self, state: &CartPoleState) -> bool {
        state.cart_position.abs() > self.env.max_pos || state.pole_angle.abs() > self.env.max_angle
    }
}

impl Default for CartPole {
    fn default() -> Self {
        CartPoleConfig::default().build_env(0)
    }
}

/// Diagnostic information from a [`CartPole`] step.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartPoleInfo {
    /// The episode ended by reaching the step limit rather than by the pole falling.
    pub truncated: bool,
}

impl Environment for CartPole {
    type Info = CartPoleInfo;

    fn observation_dimension(&self) -> usize {
        4
    }

    fn action_count(&self) -> usize {
        2
    }

    fn reset(&mut self) -> Result<Array1<f64>, EnvError> {
        // All state variables are sampled from the same range of values
        let dist = Uniform::new_inclusive(-0.05, 0.05);
        let state = CartPoleState {
            cart_position: dist.sample(&mut self.rng),
            cart_velocity: dist.sample(&mut self.rng),
            pole_angle: dist.sample(&mut self.rng),
            pole_angular_velocity: dist.sample(&mut self.rng),
        };
        self.state = Some(state);
        self.steps = 0;
        Ok(state.observation())
    }

    fn step(&mut self, action: usize) -> Result<EnvStep<CartPoleInfo>, EnvError> {
        let applied_force = match action {
            0 => -self.env.action_force,
            1 => self.env.action_force,
            _ => {
                return Err(EnvError::InvalidAction {
                    action,
                    action_count: self.action_count(),
                })
            }
        };
        let state = self.state.take().ok_or(EnvError::NotReset)?;
        let next_state = self.phys.next_state(&state, applied_force);
        self.steps += 1;

        let terminal = self.is_terminal(&next_state);
        let truncated = !terminal && self.steps >= self.env.max_steps;
        if !(terminal || truncated) {
            self.state = Some(next_state);
        }
        Ok(EnvStep {
            observation: next_state.observation(),
            reward: 1.0,
            done: terminal || truncated,
            info: CartPoleInfo { truncated },
        })
    }

    fn render(&mut self) -> Result<(), EnvError> {
        const TRACK_WIDTH: usize = 41;
        let state = match &self.state {
            Some(state) => state,
            None => return Ok(()),
        };
        let relative = (state.cart_position + self.env.max_pos) / (2.0 * self.env.max_pos);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let cart = ((relative * (TRACK_WIDTH - 1) as f64).round().max(0.0) as usize)
            .min(TRACK_WIDTH - 1);
        let track: String = (0..TRACK_WIDTH)
            .map(|i| if i == cart { 'o' } else { '-' })
            .collect();
        println!(
            "|{}|  step {:>3}  angle {:+.3} rad",
            track, self.steps, state.pole_angle
        );
        Ok(())
    }
}

/// Physical constants for the [`CartPole`] environment.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalConstants {
    /// Downward acceleration of gravity (m/s^2)
    pub gravity: f64,
    /// Mass of the cart (kg)
    pub mass_cart: f64,
    /// Mass of the pole (kg)
    pub mass_pole: f64,
    /// Half the length of the pole (m)
    pub length_half_pole: f64,
    /// Simulation time step (s)
    pub time_step: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            mass_cart: 1.0,
            mass_pole: 0.1,
            length_half_pole: 0.5,
            time_step: 0.02,
        }
    }
}

impl PhysicalConstants {
    /// Simulate one time step with a horizontal force (N) applied to the cart.
    fn next_state(&self, state: &CartPoleState, applied_force: f64) -> CartPoleState {
        let total_mass = self.mass_cart + self.mass_pole;
        let mass_length_pole = self.mass_pole * self.length_half_pole;
        let (sin_angle, cos_angle) = state.pole_angle.sin_cos();

        let temp = (applied_force
            + mass_length_pole * state.pole_angular_velocity.powi(2) * sin_angle)
            / total_mass;
        let angular_acceleration = (self.gravity * sin_angle - cos_angle * temp)
            / (self.length_half_pole
                * (4.0 / 3.0 - self.mass_pole * cos_angle.powi(2) / total_mass));
        let cart_acceleration =
            temp - mass_length_pole * angular_acceleration * cos_angle / total_mass;

        // Explicit Euler: positions advance with the velocities from the start of the step
        CartPoleState {
            cart_position: state.cart_position + self.time_step * state.cart_velocity,
            cart_velocity: state.cart_velocity + self.time_step * cart_acceleration,
            pole_angle: state.pole_angle + self.time_step * state.pole_angular_velocity,
            pole_angular_velocity: state.pole_angular_velocity
                + self.time_step * angular_acceleration,
        }
    }
}

/// Parameters for [`CartPole`] as a reinforcement learning environment.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentParams {
    /// Magnitude of the force (N) applied by actions.
    pub action_force: f64,
    /// Maximum absolute position (meters) before the episode is ended.
    pub max_pos: f64,
    /// Maximum absolute pole angle from vertical (radians) before the episode is ended.
    pub max_angle: f64,
    /// Number of steps after which the episode is cut off.
    pub max_steps: u64,
}

impl Default for EnvironmentParams {
    fn default() -> Self {
        Self {
            action_force: 10.0,
            max_pos: 2.4,
            max_angle: 12.0f64.to_radians(),
            max_steps: 500,
        }
    }
}

/// Physical state of the [`CartPole`] environment.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartPoleState {
    /// Cart position from the track midpoint (m).
    pub cart_position: f64,
    /// Cart velocity (m/s).
    pub cart_velocity: f64,
    /// Angle of the pole from vertical (radians).
    pub pole_angle: f64,
    /// Pole angular velocity about the hinge (radians / s).
    pub pole_angular_velocity: f64,
}

impl CartPoleState {
    fn observation(&self) -> Array1<f64> {
        arr1(&[
            self.cart_position,
            self.cart_velocity,
            self.pole_angle,
            self.pole_angular_velocity,
        ])
    }
}
