//! Greedy playback of a saved model

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use snake_core::{Game, Renderer, TextRenderer};
use snake_rl::{greedy_action, load_checkpoint, QNetwork};
use tracing::{debug, info};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct PlayArgs {
    /// Saved model to load (defaults to output.save_path)
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Number of episodes to play
    #[arg(short, long, default_value_t = 1)]
    pub episodes: u32,

    /// Pause between rendered frames
    #[arg(long, default_value_t = 150)]
    pub delay_ms: u64,

    /// End an episode after this many frames
    #[arg(long, default_value_t = 1_000)]
    pub max_steps: u64,
}

/// Result of one greedy episode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeSummary {
    pub frames: u64,
    pub reward: f64,
    pub fruits: u32,
    /// False when the episode hit the frame cap instead of ending
    pub finished: bool,
}

pub async fn run(args: PlayArgs, config: Config) -> Result<()> {
    let path = args.model.unwrap_or(config.output.save_path);
    let checkpoint = load_checkpoint(&path)?;
    info!(
        path = %path.display(),
        run_id = %checkpoint.metadata.run_id,
        frames = checkpoint.metadata.frames,
        "Loaded model"
    );

    let network = checkpoint.restore_network(&config.game)?;
    let mut game = Game::new(config.game.clone())?;
    let mut renderer = TextRenderer::new(std::io::stdout(), config.game.height, config.game.width);
    let delay = Duration::from_millis(args.delay_ms);

    for episode in 1..=args.episodes {
        let summary = play_episode(&network, &mut game, &mut renderer, args.max_steps, delay)
            .await
            .with_context(|| format!("Episode {episode} failed"))?;
        println!(
            "Episode {episode}: reward {:.1}, fruits {}, frames {}{}",
            summary.reward,
            summary.fruits,
            summary.frames,
            if summary.finished { "" } else { " (frame cap)" }
        );
    }
    Ok(())
}

/// Play one episode with the greedy policy, rendering every frame
pub async fn play_episode<N, R>(
    network: &N,
    game: &mut Game,
    renderer: &mut R,
    max_steps: u64,
    delay: Duration,
) -> Result<EpisodeSummary>
where
    N: QNetwork,
    R: Renderer,
{
    let (height, width) = (game.height(), game.width());
    let mut state = game.reset();
    let mut summary = EpisodeSummary {
        frames: 0,
        reward: 0.0,
        fruits: 0,
        finished: false,
    };

    while summary.frames < max_steps {
        let (action, q_values) = greedy_action(network, &state, height, width)?;
        renderer.render(&state, Some(&q_values))?;

        let outcome = game.step(action)?;
        summary.frames += 1;
        summary.reward += outcome.reward;
        summary.fruits += u32::from(outcome.fruit_eaten);
        debug!(frame = summary.frames, %action, reward = outcome.reward, "Greedy step");

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if outcome.done {
            summary.finished = true;
            break;
        }
        state = outcome.state;
    }

    renderer.render(&game.state(), None)?;
    Ok(summary)
}
