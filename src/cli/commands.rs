//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Browse pages of random users
#[derive(Parser, Debug)]
#[command(name = "randomuser")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bootstrap from the cache, then page until enough users are loaded
    Browse {
        /// Number of pages to have loaded
        #[arg(long, default_value = "1")]
        pages: usize,
    },

    /// Start over with a new seed and show the new first page
    Refresh,

    /// Show cached users without touching the network
    Cached,

    /// Show the details of one user
    Show {
        /// Zero-based position in the list
        index: usize,
    },

    /// Load the first page and print paging diagnostics
    Stats,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one object per line)
    Json,
    /// Human-readable output
    Pretty,
}
