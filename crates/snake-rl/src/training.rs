//! Training loop - coordinates pre-fill, training, and target sync

use std::collections::VecDeque;

use serde::Serialize;
use snake_core::Result;
use tracing::{debug, info, warn};

use crate::agent::Agent;
use crate::config::TrainingConfig;
use crate::experience::Reward;
use crate::network::QNetwork;

/// Why [`TrainingLoop::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StopReason {
    /// An episode reached the cumulative-reward threshold
    Solved { cumulative_reward: Reward },
    /// The configured frame cap was hit first
    FrameLimit,
    /// The caller asked the loop to stop
    Interrupted,
}

/// Running episode statistics
#[derive(Debug, Clone, Serialize)]
pub struct TrainingStats {
    pub frames: u64,
    pub episodes: u64,
    pub best_reward: Option<Reward>,
    pub last_reward: Option<Reward>,
    pub last_loss: Option<f64>,
    recent: VecDeque<Reward>,
    window: usize,
}

impl TrainingStats {
    pub fn new(window: usize) -> Self {
        Self {
            frames: 0,
            episodes: 0,
            best_reward: None,
            last_reward: None,
            last_loss: None,
            recent: VecDeque::with_capacity(window),
            window,
        }
    }

    /// Record a finished episode's cumulative reward
    pub fn record_episode(&mut self, reward: Reward) {
        self.episodes += 1;
        self.last_reward = Some(reward);
        self.best_reward = Some(self.best_reward.map_or(reward, |best| best.max(reward)));
        if self.recent.len() == self.window {
            self.recent.pop_front();
        }
        self.recent.push_back(reward);
    }

    /// Mean reward of the most recent episodes
    pub fn moving_average(&self) -> Option<Reward> {
        if self.recent.is_empty() {
            return None;
        }
        Some(self.recent.iter().sum::<Reward>() / self.recent.len() as f64)
    }
}

/// Final result of a training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub reason: StopReason,
    pub stats: TrainingStats,
}

impl TrainingReport {
    pub fn solved(&self) -> bool {
        matches!(self.reason, StopReason::Solved { .. })
    }
}

/// Drives an [`Agent`] until an episode clears the reward threshold
pub struct TrainingLoop<N> {
    agent: Agent<N>,
    config: TrainingConfig,
    stats: TrainingStats,
}

impl<N: QNetwork> TrainingLoop<N> {
    pub fn new(agent: Agent<N>, config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        let stats = TrainingStats::new(config.moving_average_window);
        Ok(Self {
            agent,
            config,
            stats,
        })
    }

    /// Fill replay memory with random-policy frames
    ///
    /// Plays until the memory holds `prefill_frames` transitions (by default
    /// its full capacity). Episodes played here do not count toward the
    /// stopping condition.
    pub fn prefill(&mut self) -> Result<usize> {
        let capacity = self.agent.replay_memory().capacity();
        let target = self.config.prefill_frames.unwrap_or(capacity).min(capacity);

        let mut played = 0;
        while self.agent.replay_memory().len() < target {
            self.agent.play_random_step()?;
            played += 1;
        }
        self.stats.frames = self.agent.frame_count();
        debug!(played, memory = self.agent.replay_memory().len(), "Replay memory pre-filled");
        Ok(played)
    }

    /// Pre-fill, then alternate training and acting until a stop condition
    ///
    /// `should_stop` is polled once per frame; a call that is already under
    /// way always finishes first.
    pub fn run(&mut self, should_stop: impl Fn() -> bool) -> Result<TrainingReport> {
        info!(
            threshold = self.config.cumulative_reward_threshold,
            sync_every_frames = self.config.sync_every_frames,
            "Starting training"
        );
        self.prefill()?;

        loop {
            if should_stop() {
                warn!(frames = self.agent.frame_count(), "Training interrupted");
                return Ok(self.report(StopReason::Interrupted));
            }
            if self
                .config
                .max_frames
                .is_some_and(|max| self.agent.frame_count() >= max)
            {
                warn!(frames = self.agent.frame_count(), "Frame limit reached");
                return Ok(self.report(StopReason::FrameLimit));
            }

            let loss = self.agent.train_on_replay_batch()?;
            let step = self.agent.play_step()?;
            self.stats.last_loss = Some(loss);
            self.stats.frames = self.agent.frame_count();

            if self.agent.frame_count() % self.config.sync_every_frames == 0 {
                self.agent.sync_target_network()?;
            }

            if step.done {
                self.stats.record_episode(step.cumulative_reward);
                if self.stats.episodes % self.config.log_every_episodes == 0 {
                    info!(
                        frame = self.agent.frame_count(),
                        episode = self.stats.episodes,
                        reward = step.cumulative_reward,
                        moving_average = self.stats.moving_average().unwrap_or_default(),
                        epsilon = self.agent.epsilon(),
                        loss,
                        "Episode finished"
                    );
                }

                if step.cumulative_reward >= self.config.cumulative_reward_threshold {
                    info!(
                        frame = self.agent.frame_count(),
                        episode = self.stats.episodes,
                        reward = step.cumulative_reward,
                        "Reward threshold reached"
                    );
                    return Ok(self.report(StopReason::Solved {
                        cumulative_reward: step.cumulative_reward,
                    }));
                }
            }
        }
    }

    fn report(&self, reason: StopReason) -> TrainingReport {
        TrainingReport {
            reason,
            stats: self.stats.clone(),
        }
    }

    pub fn agent(&self) -> &Agent<N> {
        &self.agent
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    /// Hand the trained agent back, e.g. to persist its online network
    pub fn into_agent(self) -> Agent<N> {
        self.agent
    }
}
