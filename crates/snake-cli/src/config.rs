//! Configuration management for the snake-dqn CLI

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use snake_core::GameConfig;
use snake_rl::{AgentConfig, TrainingConfig};

/// File name looked up in the working directory and the user config dir
pub const CONFIG_FILE_NAME: &str = "snake-dqn.toml";

/// Effective configuration: defaults, then file, then environment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub game: GameConfig,
    pub agent: AgentConfig,
    pub training: TrainingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where `train` writes the model and `play` reads it by default
    pub save_path: PathBuf,
    pub log_level: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            save_path: PathBuf::from("models/snake-dqn.json"),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        let path = Self::find_config_file();
        Self::load_with(path.as_deref(), Self::environment())
    }

    /// Load from an explicit file and environment source
    pub fn load_with(path: Option<&Path>, environment: Environment) -> Result<Self> {
        let mut builder = ConfigBuilder::<config::builder::DefaultState>::default();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path.to_path_buf()).required(false));
        }
        builder = builder.add_source(environment);

        let config: Self = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// `SNAKE_DQN__SECTION__KEY` variables, e.g. `SNAKE_DQN__GAME__HEIGHT=12`
    pub fn environment() -> Environment {
        Environment::with_prefix("SNAKE_DQN")
            .separator("__")
            .try_parsing(true)
    }

    pub fn validate(&self) -> Result<()> {
        self.game.validate().context("Invalid [game] configuration")?;
        self.agent.validate().context("Invalid [agent] configuration")?;
        self.training
            .validate()
            .context("Invalid [training] configuration")?;
        self.output
            .log_level
            .parse::<tracing::Level>()
            .map_err(|_| {
                anyhow::anyhow!(
                    "Invalid [output] configuration: unknown log_level {:?}",
                    self.output.log_level
                )
            })?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Find the configuration file
    pub fn find_config_file() -> Option<PathBuf> {
        // Check in order: SNAKE_DQN_CONFIG env, ./snake-dqn.toml, ~/.config/snake-dqn/snake-dqn.toml
        if let Ok(path) = std::env::var("SNAKE_DQN_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".config").join("snake-dqn").join(CONFIG_FILE_NAME);
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }
}
