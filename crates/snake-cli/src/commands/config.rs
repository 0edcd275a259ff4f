//! Configuration management commands

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::config::{Config, CONFIG_FILE_NAME};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write the default configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn run(cmd: ConfigCommands, config: Config) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(&config).await,
        ConfigCommands::Init { force } => init(Path::new(CONFIG_FILE_NAME), force).await,
    }
}

async fn show(config: &Config) -> Result<()> {
    match Config::find_config_file() {
        Some(path) => println!("# Config file: {}\n", path.display()),
        None => println!("# No configuration file found. Using defaults.\n"),
    }
    println!("{}", config.to_toml()?);
    Ok(())
}

async fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("Configuration file already exists: {}", path.display());
        println!("Use --force to overwrite");
        return Ok(());
    }

    std::fs::write(path, Config::default().to_toml()?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Configuration file created: {}", path.display());
    Ok(())
}
