//! Command-line argument parsing for PartAssist
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// PartAssist - answers about refrigerator and dishwasher parts
#[derive(Parser, Debug)]
#[command(name = "partassist")]
#[command(version)]
#[command(about = "Retrieval-augmented assistant for refrigerator and dishwasher parts", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true, env = "PARTASSIST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Embed a part corpus and append it to the index
    Index {
        /// JSON Lines corpus (defaults to index.corpus from config)
        #[arg(long)]
        corpus: Option<PathBuf>,
    },

    /// Answer a single question and print the payload
    Ask {
        /// The question to answer
        #[arg(value_name = "QUESTION")]
        question: String,

        /// Print the raw JSON payload instead of formatted output
        #[arg(long)]
        json: bool,
    },

    /// Serve the chat HTTP endpoint
    Serve {
        /// Listen address (defaults to server.bind from config)
        #[arg(long)]
        bind: Option<String>,

        /// Index the configured corpus before accepting traffic
        #[arg(long)]
        reindex: bool,
    },

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl Verbosity {
    /// Check if should show progress bars
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Log filter implied by the flags, if they override the configured one
    pub fn log_filter(&self) -> Option<&'static str> {
        match self {
            Verbosity::Quiet => Some("error"),
            Verbosity::Normal => None,
            Verbosity::Verbose => Some("debug"),
            Verbosity::VeryVerbose => Some("trace"),
        }
    }
}
