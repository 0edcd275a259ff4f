//! Agent and training-loop configuration

use serde::{Deserialize, Serialize};
use snake_core::config::ensure_positive;
use snake_core::{Result, SnakeError};

use crate::schedule::EpsilonSchedule;

/// Construction parameters for an [`crate::Agent`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Number of transitions kept in replay memory
    pub replay_capacity: usize,
    pub epsilon_init: f64,
    pub epsilon_final: f64,
    /// Frames over which epsilon decays linearly to `epsilon_final`
    pub epsilon_num_frames: u64,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Reward discount rate (gamma)
    pub discount_factor: f64,
    /// Width of the reference network's hidden layer
    pub hidden_units: usize,
    /// Seed for exploration, replay sampling, and weight init
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            replay_capacity: 10_000,
            epsilon_init: 0.5,
            epsilon_final: 0.01,
            epsilon_num_frames: 100_000,
            batch_size: 64,
            learning_rate: 1e-3,
            discount_factor: 0.99,
            hidden_units: 128,
            seed: None,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("replay_capacity", self.replay_capacity)?;
        ensure_positive("batch_size", self.batch_size)?;
        ensure_positive("hidden_units", self.hidden_units)?;
        self.epsilon_schedule()?;

        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(SnakeError::Config(format!(
                "Expected learning_rate to be a positive number, but received {}",
                self.learning_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(SnakeError::Config(format!(
                "Expected discount_factor to be within [0, 1], but received {}",
                self.discount_factor
            )));
        }
        Ok(())
    }

    pub fn epsilon_schedule(&self) -> Result<EpsilonSchedule> {
        EpsilonSchedule::new(self.epsilon_init, self.epsilon_final, self.epsilon_num_frames)
    }
}

/// Parameters of the outer training loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Copy online weights into the target network every this many frames
    pub sync_every_frames: u64,
    /// Stop once an episode's cumulative reward reaches this value
    pub cumulative_reward_threshold: f64,
    /// Random-policy frames played before training (defaults to the
    /// replay capacity, and never exceeds it)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefill_frames: Option<usize>,
    /// Hard cap on total frames, counted from the start of pre-fill
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_frames: Option<u64>,
    /// Log an episode summary every this many episodes
    pub log_every_episodes: u64,
    /// Number of recent episodes in the reported moving average
    pub moving_average_window: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            sync_every_frames: 1_000,
            cumulative_reward_threshold: 100.0,
            prefill_frames: None,
            max_frames: None,
            log_every_episodes: 100,
            moving_average_window: 100,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sync_every_frames == 0 {
            return Err(SnakeError::Config(
                "Expected sync_every_frames to be a positive integer, but received 0".to_string(),
            ));
        }
        if self.log_every_episodes == 0 {
            return Err(SnakeError::Config(
                "Expected log_every_episodes to be a positive integer, but received 0".to_string(),
            ));
        }
        ensure_positive("moving_average_window", self.moving_average_window)?;
        if let Some(frames) = self.prefill_frames {
            ensure_positive("prefill_frames", frames)?;
        }
        if self.max_frames == Some(0) {
            return Err(SnakeError::Config(
                "Expected max_frames to be a positive integer, but received 0".to_string(),
            ));
        }
        if !self.cumulative_reward_threshold.is_finite() {
            return Err(SnakeError::Config(format!(
                "Expected cumulative_reward_threshold to be a finite number, but received {}",
                self.cumulative_reward_threshold
            )));
        }
        Ok(())
    }
}
