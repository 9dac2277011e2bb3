//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// schemabridge - Schema-driven conversion between configuration and backend objects.
#[derive(Parser, Debug)]
#[command(name = "schemabridge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Directory with extra resource schemas.
    #[arg(long, global = true, env = "SCHEMABRIDGE_SCHEMA_DIR")]
    pub schema_dir: Option<PathBuf>,

    /// Directory holding state files.
    #[arg(long, global = true, env = "SCHEMABRIDGE_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the known resource schemas.
    Schemas,

    /// Validate a schema file or a built-in schema.
    Validate {
        /// Schema file to validate.
        #[arg(long, conflicts_with = "resource")]
        schema: Option<PathBuf>,

        /// Built-in resource to validate (all when neither option is given).
        #[arg(long)]
        resource: Option<String>,
    },

    /// Expand a configuration document into a backend document.
    Expand {
        /// Resource type of the document.
        #[arg(short, long)]
        resource: String,

        /// Configuration document (JSON).
        file: PathBuf,
    },

    /// Flatten a backend document into a configuration document.
    Flatten {
        /// Resource type of the document.
        #[arg(short, long)]
        resource: String,

        /// Backend document (JSON).
        file: PathBuf,

        /// Prior configuration document to flatten against.
        #[arg(long, conflicts_with = "state")]
        prior: Option<PathBuf>,

        /// Use the stored state of this instance as the prior configuration.
        #[arg(long)]
        state: Option<String>,

        /// Store the result as the state of this instance.
        #[arg(long)]
        save: Option<String>,
    },

    /// Expand a configuration and flatten it back, reporting any drift.
    Roundtrip {
        /// Resource type of the document.
        #[arg(short, long)]
        resource: String,

        /// Configuration document (JSON).
        file: PathBuf,
    },

    /// Manage stored state.
    State {
        /// State subcommand.
        #[command(subcommand)]
        command: StateCommands,
    },
}

/// State management subcommands.
#[derive(Subcommand, Debug)]
pub enum StateCommands {
    /// List stored instances.
    List,

    /// Show the stored state of an instance.
    Show {
        /// Instance id.
        id: String,
    },

    /// Delete the stored state of an instance.
    Rm {
        /// Instance id.
        id: String,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
