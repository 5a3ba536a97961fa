//! Discounted returns
use super::Episode;
use crate::error::ConfigError;

/// Check that a discount factor is in `(0, 1]`.
pub fn check_discount_factor(discount_factor: f64) -> Result<(), ConfigError> {
    if discount_factor > 0.0 && discount_factor <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::DiscountFactor(discount_factor))
    }
}

/// Discounted return at each step of a reward sequence.
///
/// `G[t] = r[t] + discount_factor * G[t + 1]` with `G[n] = 0`.
///
/// # Errors
/// If `discount_factor` is not in `(0, 1]`.
pub fn discounted_returns(rewards: &[f64], discount_factor: f64) -> Result<Vec<f64>, ConfigError> {
    check_discount_factor(discount_factor)?;
    let mut returns = vec![0.0; rewards.len()];
    let mut acc = 0.0;
    for (ret, reward) in returns.iter_mut().zip(rewards).rev() {
        acc = reward + discount_factor * acc;
        *ret = acc;
    }
    Ok(returns)
}

/// Discounted return from each step of an episode to its end.
pub fn compute_returns(episode: &Episode, discount_factor: f64) -> Result<Vec<f64>, ConfigError> {
    let rewards: Vec<f64> = episode.rewards().collect();
    discounted_returns(&rewards, discount_factor)
}
