//! CLI command modules

pub mod config;
pub mod play;
pub mod train;
