//! snake-rl - Deep Q-learning for the snake game
//!
//! This crate provides the experience replay memory, the epsilon-greedy
//! agent, the Q-function approximator contract with a small reference
//! network, and the training loop that keeps an online and a target
//! network in step.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::float_cmp)]
#![allow(clippy::similar_names)]

pub mod agent;
pub mod config;
pub mod experience;
pub mod features;
pub mod network;
pub mod persistence;
pub mod schedule;
pub mod training;

pub use agent::{greedy_action, Agent, PlayStep};
pub use config::{AgentConfig, TrainingConfig};
pub use experience::{ReplayMemory, Reward, Transition};
pub use features::{encode_batch, encode_state};
pub use network::{MlpConfig, MlpQNetwork, QNetwork, WeightTensor, Weights};
pub use persistence::{load_checkpoint, save_checkpoint, ModelCheckpoint, ModelMetadata};
pub use schedule::EpsilonSchedule;
pub use training::{StopReason, TrainingLoop, TrainingReport, TrainingStats};
