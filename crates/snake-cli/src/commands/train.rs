//! Training command

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use snake_core::{Game, SnakeError};
use snake_rl::{save_checkpoint, Agent, ModelCheckpoint, StopReason, TrainingLoop};
use tracing::info;
use uuid::Uuid;

use crate::config::Config;

#[derive(Args, Debug, Default)]
pub struct TrainArgs {
    /// Stop once an episode's cumulative reward reaches this value
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Hard cap on frames played
    #[arg(long)]
    pub max_frames: Option<u64>,

    /// Where to save the trained model
    #[arg(short, long)]
    pub save_path: Option<PathBuf>,

    /// Seed for the game and agent
    #[arg(long)]
    pub seed: Option<u64>,
}

impl TrainArgs {
    /// Command-line flags win over every other configuration layer
    fn apply(&self, config: &mut Config) {
        if let Some(threshold) = self.threshold {
            config.training.cumulative_reward_threshold = threshold;
        }
        if let Some(max_frames) = self.max_frames {
            config.training.max_frames = Some(max_frames);
        }
        if let Some(path) = &self.save_path {
            config.output.save_path.clone_from(path);
        }
        if let Some(seed) = self.seed {
            config.agent.seed = Some(seed);
        }
    }
}

pub async fn run(args: TrainArgs, mut config: Config) -> Result<()> {
    args.apply(&mut config);
    config.validate()?;

    let run_id = Uuid::new_v4();
    let game = match config.agent.seed {
        Some(seed) => Game::seeded(config.game.clone(), seed)?,
        None => Game::new(config.game.clone())?,
    };
    let agent = Agent::new(game, config.agent.clone())?;
    let mut training = TrainingLoop::new(agent, config.training.clone())?;

    info!(
        %run_id,
        height = config.game.height,
        width = config.game.width,
        replay_capacity = config.agent.replay_capacity,
        "Training run started"
    );

    let stop = Arc::new(AtomicBool::new(false));
    let signal_task = {
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            crate::shutdown_signal().await;
            stop.store(true, Ordering::Relaxed);
        })
    };

    let flag = Arc::clone(&stop);
    let result = tokio::task::spawn_blocking(move || {
        let report = training.run(|| flag.load(Ordering::Relaxed))?;
        Ok::<_, SnakeError>((report, training.into_agent()))
    })
    .await
    .context("Training task panicked")?;
    signal_task.abort();

    let (report, agent) = result.context("Training failed")?;

    let checkpoint = ModelCheckpoint::from_agent(&agent, &report.stats, run_id);
    save_checkpoint(&checkpoint, &config.output.save_path)?;

    let stats = &report.stats;
    match report.reason {
        StopReason::Solved { cumulative_reward } => println!(
            "Solved after {} episodes ({} frames): episode reward {cumulative_reward:.1}",
            stats.episodes, stats.frames
        ),
        StopReason::FrameLimit => println!(
            "Frame limit reached after {} episodes ({} frames)",
            stats.episodes, stats.frames
        ),
        StopReason::Interrupted => println!(
            "Interrupted after {} episodes ({} frames)",
            stats.episodes, stats.frames
        ),
    }
    if let Some(best) = stats.best_reward {
        println!("Best episode reward: {best:.1}");
    }
    println!("Model saved to {}", config.output.save_path.display());

    Ok(())
}
