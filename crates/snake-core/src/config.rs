//! Board configuration

use serde::{Deserialize, Serialize};

use crate::error::{Result, SnakeError};

/// Construction parameters for a [`crate::Game`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Board height in cells
    pub height: usize,
    /// Board width in cells
    pub width: usize,
    /// Number of fruits present on the board at any given time
    pub num_fruits: usize,
    /// Initial length of the snake in cells
    pub init_len: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            height: 9,
            width: 9,
            num_fruits: 1,
            init_len: 2,
        }
    }
}

impl GameConfig {
    pub fn new(height: usize, width: usize, num_fruits: usize, init_len: usize) -> Self {
        Self {
            height,
            width,
            num_fruits,
            init_len,
        }
    }

    /// Reject non-positive dimensions and snakes that cannot start straight
    pub fn validate(&self) -> Result<()> {
        ensure_positive("height", self.height)?;
        ensure_positive("width", self.width)?;
        ensure_positive("num_fruits", self.num_fruits)?;
        ensure_positive("init_len", self.init_len)?;

        if self.init_len > self.width {
            return Err(SnakeError::Config(format!(
                "Expected init_len ({}) to fit within width ({})",
                self.init_len, self.width
            )));
        }
        Ok(())
    }

    /// Total number of cells on the board
    pub fn area(&self) -> usize {
        self.height * self.width
    }
}

/// Fail with a descriptive configuration error unless `value > 0`
pub fn ensure_positive(name: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(SnakeError::Config(format!(
            "Expected {name} to be a positive integer, but received {value}"
        )));
    }
    Ok(())
}
