//! Command-line interface definitions.
//!
//! # Example
//!
//! ```bash
//! # Find duplicates under two roots with the default (pipelined) strategy
//! dupscan scan ~/Photos /mnt/backup/Photos
//!
//! # Single-threaded walk, 8 digest threads, JSON output
//! dupscan scan ~/Downloads --strategy hybrid --digest-threads 8 --output json
//!
//! # List the files that share a size with another file
//! dupscan candidates ~/Downloads
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::Config;
use crate::duplicates::ScanStrategy;
use crate::scanner::DigestAlgorithm;

/// Content-based duplicate file scanner.
///
/// Files are first grouped by size; only files sharing a size are read and
/// digested. Files with equal size and digest are reported as duplicates.
#[derive(Debug, Parser)]
#[command(name = "dupscan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Find groups of duplicate files
    Scan(ScanArgs),
    /// List files that passed size filtering, without digesting them
    Candidates(CandidatesArgs),
}

/// Options shared by every subcommand that runs the engine.
#[derive(Debug, Args)]
pub struct EngineArgs {
    /// Directories to scan
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Scheduling strategy
    #[arg(long, value_enum)]
    pub strategy: Option<ScanStrategy>,

    /// Content digest used to compare files
    #[arg(long, value_enum)]
    pub digest: Option<DigestAlgorithm>,

    /// Threads walking directories (pipelined strategy)
    #[arg(long, value_name = "N", value_parser = parse_threads)]
    pub traversal_threads: Option<usize>,

    /// Threads digesting files (hybrid and pipelined strategies)
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N", value_parser = parse_threads)]
    pub digest_threads: Option<usize>,

    /// Follow symbolic links during scan
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Hide progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Read settings from this file instead of the default config.toml
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl EngineArgs {
    /// Apply the flags on top of file and environment settings.
    #[must_use]
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(digest) = self.digest {
            config.digest = digest;
        }
        if let Some(threads) = self.traversal_threads {
            config.traversal_threads = threads;
        }
        if let Some(threads) = self.digest_threads {
            config.digest_threads = threads;
        }
        config.follow_symlinks |= self.follow_symlinks;
        config
    }
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the candidates subcommand.
#[derive(Debug, Args)]
pub struct CandidatesArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing
    Text,
    /// JSON for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a thread count, which must be at least 1.
///
/// # Errors
///
/// Returns an error for non-numeric input or zero.
pub fn parse_threads(s: &str) -> Result<usize, String> {
    let n: usize = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid thread count: '{s}'"))?;
    if n == 0 {
        return Err("Thread count must be at least 1".to_string());
    }
    Ok(n)
}
