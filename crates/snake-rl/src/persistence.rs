//! Model persistence for saving and loading trained networks
//!
//! A checkpoint is a single pretty-printed JSON document holding the
//! online network's weights plus enough metadata to rebuild a matching
//! network for the same board size.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snake_core::{GameConfig, NUM_ACTIONS};
use tracing::info;
use uuid::Uuid;

use crate::agent::Agent;
use crate::features::input_dim;
use crate::network::{MlpConfig, MlpQNetwork, QNetwork, Weights};
use crate::training::TrainingStats;

/// Metadata saved with the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Identifier of the training run that produced the model
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub grid_height: usize,
    pub grid_width: usize,
    pub hidden_units: usize,
    /// Total frames played when the checkpoint was taken
    pub frames: u64,
    pub episodes: u64,
    pub best_reward: Option<f64>,
    /// Crate version for compatibility checking
    pub version: String,
}

/// Weights plus metadata, as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCheckpoint {
    pub metadata: ModelMetadata,
    pub weights: Weights,
}

impl ModelCheckpoint {
    /// Snapshot the agent's online network
    pub fn from_agent(agent: &Agent<MlpQNetwork>, stats: &TrainingStats, run_id: Uuid) -> Self {
        let game = agent.game();
        Self {
            metadata: ModelMetadata {
                run_id,
                created_at: Utc::now(),
                grid_height: game.height(),
                grid_width: game.width(),
                hidden_units: agent.online_network().hidden_units(),
                frames: agent.frame_count(),
                episodes: stats.episodes,
                best_reward: stats.best_reward,
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            weights: agent.online_network().weights(),
        }
    }

    /// Rebuild the saved network for a board of the given configuration
    pub fn restore_network(&self, game: &GameConfig) -> Result<MlpQNetwork> {
        if (self.metadata.grid_height, self.metadata.grid_width) != (game.height, game.width) {
            bail!(
                "model was trained on a {}x{} board, but the game is {}x{}",
                self.metadata.grid_height,
                self.metadata.grid_width,
                game.height,
                game.width
            );
        }

        let mut network = MlpQNetwork::new(&MlpConfig {
            input_dim: input_dim(game.height, game.width),
            hidden_units: self.metadata.hidden_units,
            num_actions: NUM_ACTIONS,
            learning_rate: 1e-3,
            seed: Some(0),
        })?;
        network
            .set_weights(&self.weights)
            .context("Checkpoint weights do not fit the network")?;
        Ok(network)
    }
}

/// Write a checkpoint, creating parent directories if needed
pub fn save_checkpoint(checkpoint: &ModelCheckpoint, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create model directory {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(checkpoint).context("Failed to serialize model")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write model to {}", path.display()))?;

    info!(
        path = %path.display(),
        run_id = %checkpoint.metadata.run_id,
        frames = checkpoint.metadata.frames,
        "Saved model"
    );
    Ok(())
}

/// Read a checkpoint written by [`save_checkpoint`]
pub fn load_checkpoint(path: &Path) -> Result<ModelCheckpoint> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read model from {}", path.display()))?;
    let checkpoint: ModelCheckpoint = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse model file {}", path.display()))?;
    Ok(checkpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use snake_core::Game;

    fn create_test_agent() -> Agent {
        let game = Game::seeded(GameConfig::new(5, 6, 1, 2), 3).unwrap();
        let config = AgentConfig {
            replay_capacity: 10,
            hidden_units: 8,
            seed: Some(9),
            ..AgentConfig::default()
        };
        Agent::new(game, config).unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/model.json");

        let agent = create_test_agent();
        let mut stats = TrainingStats::new(5);
        stats.record_episode(4.2);
        let checkpoint = ModelCheckpoint::from_agent(&agent, &stats, Uuid::new_v4());

        save_checkpoint(&checkpoint, &path).unwrap();
        let loaded = load_checkpoint(&path).unwrap();

        assert_eq!(loaded, checkpoint);
        assert_eq!(loaded.metadata.grid_height, 5);
        assert_eq!(loaded.metadata.grid_width, 6);
        assert_eq!(loaded.metadata.best_reward, Some(4.2));
    }

    #[test]
    fn test_restore_network_matches_online() {
        let agent = create_test_agent();
        let checkpoint =
            ModelCheckpoint::from_agent(&agent, &TrainingStats::new(1), Uuid::new_v4());

        let restored = checkpoint
            .restore_network(&GameConfig::new(5, 6, 1, 2))
            .unwrap();
        assert_eq!(restored.weights(), agent.online_network().weights());
    }

    #[test]
    fn test_restore_rejects_other_board() {
        let agent = create_test_agent();
        let checkpoint =
            ModelCheckpoint::from_agent(&agent, &TrainingStats::new(1), Uuid::new_v4());

        let err = checkpoint
            .restore_network(&GameConfig::new(9, 9, 1, 2))
            .unwrap_err();
        assert!(err.to_string().contains("5x6"));
    }

    #[test]
    fn test_weights_survive_save_bit_for_bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let agent = create_test_agent();
        let mut checkpoint =
            ModelCheckpoint::from_agent(&agent, &TrainingStats::new(1), Uuid::new_v4());
        let awkward = [0.210_603_337_500_994_89, -1.0 / 3.0, 1e-300, f64::MIN_POSITIVE];
        checkpoint.weights.tensors[0].data[..awkward.len()].copy_from_slice(&awkward);

        save_checkpoint(&checkpoint, &path).unwrap();
        let loaded = load_checkpoint(&path).unwrap();

        for (saved, restored) in checkpoint.weights.tensors.iter().zip(&loaded.weights.tensors) {
            let saved_bits: Vec<u64> = saved.data.iter().map(|v| v.to_bits()).collect();
            let restored_bits: Vec<u64> = restored.data.iter().map(|v| v.to_bits()).collect();
            assert_eq!(saved_bits, restored_bits, "tensor {}", saved.name);
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_checkpoint(&dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read model"));
    }
}
