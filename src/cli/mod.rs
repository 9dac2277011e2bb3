//! CLI module for the schemabridge tool.
//!
//! This module provides the command-line interface for converting documents
//! and inspecting stored state.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat, StateCommands};
pub use output::OutputFormatter;
