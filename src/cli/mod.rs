//! Command-line interface for inspecting the persistent cache

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
