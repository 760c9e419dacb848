//! CLI subcommand implementations.

pub mod display;
pub mod import;
pub mod sheet;
pub mod sheets;
pub mod start;
pub mod stop;
