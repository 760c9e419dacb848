//! Terminal timekeeper CLI library.
//!
//! This crate provides the command-line interface for the timekeeper.

mod cli;
pub mod commands;
mod config;
mod prompt;
mod render;

pub use cli::{Cli, Commands};
pub use config::Config;
