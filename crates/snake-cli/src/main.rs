//! snake-dqn - Train a deep Q-network to play snake
//!
//! `train` runs the DQN training loop and saves the online network,
//! `play` loads a saved model and renders greedy episodes in the terminal.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::unused_async)]
#![allow(clippy::float_cmp)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use crate::config::Config;
use commands::{play, train};

#[derive(Parser)]
#[command(name = "snake-dqn")]
#[command(author, version, about = "snake-dqn - deep Q-learning for the snake game", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model until it reaches the reward threshold
    Train(train::TrainArgs),

    /// Watch a trained model play
    Play(play::PlayArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(commands::config::ConfigCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    // Initialize logging based on verbosity
    let log_level = if cli.verbose {
        "debug"
    } else {
        config.output.log_level.as_str()
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("snake_dqn={log_level},snake_rl={log_level},snake_core={log_level}").into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);
    if cli.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    match Config::find_config_file() {
        Some(path) => debug!("Loaded config from: {:?}", path),
        None => debug!("No config file found, using defaults"),
    }

    match cli.command {
        Commands::Train(args) => train::run(args, config).await,
        Commands::Play(args) => play::run(args, config).await,
        Commands::Config(cmd) => commands::config::run(cmd, config).await,
    }
}

/// Resolves once the user asks training to stop (Ctrl+C, or SIGTERM on unix)
///
/// A handler that cannot be installed never fires; the other one still can.
pub(crate) async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let source = tokio::select! {
        () = interrupt => "ctrl-c",
        () = terminate => "sigterm",
    };
    info!(signal = source, "Stop requested, finishing the current frame");
}
