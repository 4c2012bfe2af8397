//! tablesync CLI Library
//!
//! Command-line interface for pushing CSV/TSV files into a Supabase table.
//!
//! # Overview
//!
//! - **Bulk insert**: `tablesync insert --table questions questions.csv`
//! - **Keyed update**: `tablesync update --table exams --key exam_id exams.csv`
//! - **Row count**: `tablesync count questions.csv`
//!
//! Connection settings come from `SUPABASE_URL` and `SUPABASE_SERVICE_KEY`
//! (environment or `.env`), sync settings from `tablesync.toml` and
//! `TABLESYNC_*` variables, with command-line flags taking precedence.

pub mod commands;
pub mod config;
pub mod error;
pub mod progress;

// Re-export commonly used types
pub use error::{CliError, Result};

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// tablesync - load delimited files into a remote table
#[derive(Parser, Debug)]
#[command(name = "tablesync")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to ./tablesync.toml when present)
    #[arg(short, long, global = true, env = "TABLESYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Field delimiter: a single character or "tab"
    #[arg(short, long, global = true)]
    pub delimiter: Option<String>,

    /// Print the run summary as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Insert every row of a file, in batches
    Insert {
        #[command(flatten)]
        target: TargetArgs,

        /// Rows per insert request
        #[arg(short, long)]
        batch_size: Option<usize>,
    },

    /// Update existing rows matched on a primary key column
    Update {
        #[command(flatten)]
        target: TargetArgs,

        /// Primary key column
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Count the data rows of a file without contacting the remote store
    Count {
        /// Source file
        file: PathBuf,
    },
}

/// Table and source shared by insert and update
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Target table
    #[arg(short, long)]
    pub table: String,

    /// Source file (CSV or TSV, header row first)
    pub file: PathBuf,

    /// Skip the counting pass used for the progress total
    #[arg(long)]
    pub no_count: bool,
}
