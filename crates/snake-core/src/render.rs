//! Rendering collaborator
//!
//! The game never depends on a renderer; front ends receive snapshots
//! and optional action values and present them however they like.

use std::io::Write;

use crate::action::ALL_ACTIONS;
use crate::error::Result;
use crate::state::{Cell, GameState};

/// Presents game snapshots
pub trait Renderer {
    /// Draw `state`, optionally annotated with the current action values
    fn render(&mut self, state: &GameState, q_values: Option<&[f64]>) -> Result<()>;
}

/// Draws the board as bordered ASCII text
pub struct TextRenderer<W> {
    out: W,
    height: usize,
    width: usize,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W, height: usize, width: usize) -> Self {
        Self { out, height, width }
    }

    /// Consume the renderer and hand back its writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn glyph(state: &GameState, cell: Cell) -> char {
        match state.snake.iter().position(|&c| c == cell) {
            Some(0) => 'H',
            Some(_) => 'o',
            None if state.is_fruit(cell) => '*',
            None => '.',
        }
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn render(&mut self, state: &GameState, q_values: Option<&[f64]>) -> Result<()> {
        let border = format!("+{}+", "-".repeat(self.width));
        writeln!(self.out, "{border}")?;
        for row in 0..self.height {
            let line: String = (0..self.width)
                .map(|col| Self::glyph(state, Cell::new(row, col)))
                .collect();
            writeln!(self.out, "|{line}|")?;
        }
        writeln!(self.out, "{border}")?;

        if let Some(values) = q_values {
            let labelled: Vec<String> = ALL_ACTIONS
                .iter()
                .zip(values)
                .map(|(action, value)| format!("{action}={value:.3}"))
                .collect();
            writeln!(self.out, "q: {}", labelled.join(" "))?;
        }
        self.out.flush()?;
        Ok(())
    }
}
