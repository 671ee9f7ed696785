//! CLI module for Elastiform.
//!
//! This module provides the command-line surface: argument parsing and the
//! rendering of plans and apply reports.

mod commands;
mod output;

pub use commands::{Cli, Commands, FilterArgs, LogFormat, OutputFormat};
pub use output::OutputFormatter;
