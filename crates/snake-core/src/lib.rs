//! snake-core - Grid game state machine and shared types
//!
//! This crate provides the deterministic snake game simulated by the
//! training loop, the error taxonomy shared by every snake-dqn crate, and
//! the rendering collaborator interface.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod config;
pub mod error;
pub mod game;
pub mod render;
pub mod state;

pub use action::{Action, Direction, ALL_ACTIONS, NUM_ACTIONS};
pub use config::GameConfig;
pub use error::{Result, SnakeError};
pub use game::{Game, StepOutcome, DEATH_REWARD, FRUIT_REWARD, NO_FRUIT_REWARD};
pub use render::{Renderer, TextRenderer};
pub use state::{Cell, GameState};
