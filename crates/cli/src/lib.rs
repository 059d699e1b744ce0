//! runbridge - command-line host for the run core
//!
//! Registers a file provider, two interpreter-backed executors and a
//! stdout viewer, then maps subcommands onto core operations.
pub mod cli;
pub mod commands;
pub mod display;
pub mod host;
pub mod utils;

// Re-export commonly used items
pub use cli::{Cli, Commands, ParamsCommand};
pub use host::{Host, LastRun};
