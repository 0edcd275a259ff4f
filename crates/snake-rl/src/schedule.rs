//! Linear epsilon annealing for epsilon-greedy exploration

use serde::{Deserialize, Serialize};
use snake_core::{Result, SnakeError};

/// Linear anneal from `init` to `final_value` over `num_frames` frames,
/// holding at `final_value` afterwards
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonSchedule {
    init: f64,
    final_value: f64,
    num_frames: u64,
}

impl EpsilonSchedule {
    pub fn new(init: f64, final_value: f64, num_frames: u64) -> Result<Self> {
        for (name, value) in [("epsilon_init", init), ("epsilon_final", final_value)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SnakeError::Config(format!(
                    "Expected {name} to be within [0, 1], but received {value}"
                )));
            }
        }
        if num_frames == 0 {
            return Err(SnakeError::Config(
                "Expected epsilon_num_frames to be a positive integer, but received 0".to_string(),
            ));
        }
        Ok(Self {
            init,
            final_value,
            num_frames,
        })
    }

    /// Exploration probability at `frame`
    pub fn value(&self, frame: u64) -> f64 {
        if frame >= self.num_frames {
            return self.final_value;
        }
        self.init + frame as f64 * (self.final_value - self.init) / self.num_frames as f64
    }

    pub fn init(&self) -> f64 {
        self.init
    }

    pub fn final_value(&self) -> f64 {
        self.final_value
    }

    pub fn num_frames(&self) -> u64 {
        self.num_frames
    }
}
