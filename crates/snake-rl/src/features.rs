//! Board encoding fed to the Q-function approximator
//!
//! A state becomes a `height x width x 2` grid flattened row-major:
//! channel 0 marks the snake (head 2, body 1), channel 1 marks fruit.

use ndarray::{Array1, Array2, ArrayViewMut1};
use snake_core::GameState;

/// Number of planes per cell
pub const CHANNELS: usize = 2;

/// Length of an encoded state for a `height x width` board
pub fn input_dim(height: usize, width: usize) -> usize {
    height * width * CHANNELS
}

/// Encode a single board
pub fn encode_state(state: &GameState, height: usize, width: usize) -> Array1<f64> {
    let mut features = Array1::zeros(input_dim(height, width));
    write_state(features.view_mut(), state, width);
    features
}

/// Encode a batch of boards, one per row
pub fn encode_batch(states: &[&GameState], height: usize, width: usize) -> Array2<f64> {
    let mut batch = Array2::zeros((states.len(), input_dim(height, width)));
    for (row, state) in batch.rows_mut().into_iter().zip(states) {
        write_state(row, state, width);
    }
    batch
}

fn write_state(mut out: ArrayViewMut1<'_, f64>, state: &GameState, width: usize) {
    for (i, cell) in state.snake.iter().enumerate() {
        out[(cell.row * width + cell.col) * CHANNELS] = if i == 0 { 2.0 } else { 1.0 };
    }
    for cell in &state.fruits {
        out[(cell.row * width + cell.col) * CHANNELS + 1] = 1.0;
    }
}
