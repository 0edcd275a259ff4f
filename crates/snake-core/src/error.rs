//! Error types for snake-dqn

use thiserror::Error;

/// Main error type for snake-dqn
#[derive(Error, Debug)]
pub enum SnakeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid action index: {0}")]
    InvalidAction(usize),

    #[error("Invalid game state: {0}")]
    InvalidState(String),

    #[error("Game is over; call reset() before stepping again")]
    GameOver,

    #[error("Cannot sample from an empty replay memory")]
    EmptyReplayMemory,

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for snake-dqn operations
pub type Result<T> = std::result::Result<T, SnakeError>;
