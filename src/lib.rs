//! dupscan - content-based duplicate file scanner
//!
//! Finds groups of files with identical content under one or more
//! directory trees. Files are first filtered by size, so only files that
//! share their size with another file are ever read; the survivors are
//! grouped by `(size, digest)`.
//!
//! The engine lives in [`duplicates`] and [`scanner`]. The remaining modules
//! are the command-line front end.
//!
//! # Example
//!
//! ```no_run
//! use dupscan::duplicates::{DuplicateFinder, FinderConfig, ScanStrategy};
//! use std::path::PathBuf;
//!
//! let finder = DuplicateFinder::new(ScanStrategy::Hybrid, FinderConfig::default());
//! let (groups, _summary) = finder.find_duplicates(&[PathBuf::from(".")])?;
//! for group in &groups {
//!     println!("{} copies of {} bytes", group.len(), group.size);
//! }
//! # Ok::<(), dupscan::duplicates::FinderError>(())
//! ```

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};

use crate::cli::{CandidatesArgs, Cli, Commands, EngineArgs, OutputFormat, ScanArgs};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, ScanStrategy};
use crate::error::ExitCode;
use crate::output::{JsonCandidates, JsonOutput, JsonSummary, TextOutput};
use crate::progress::Progress;
use crate::scanner::{normalize_roots, FileRef};
use crate::signal::ShutdownHandler;

/// Run the application for parsed arguments and return the exit code.
///
/// # Errors
///
/// Returns an error if no usable root was given, the config is invalid,
/// the scan was interrupted or output could not be written.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    let handler = signal::install_handler()?;

    match cli.command {
        Commands::Scan(args) => run_scan(&args, cli.quiet, &handler),
        Commands::Candidates(args) => run_candidates(&args, cli.quiet, &handler),
    }
}

/// Engine setup resolved from config file, environment and flags.
struct Prepared {
    finder: DuplicateFinder,
    strategy: ScanStrategy,
    roots: Vec<std::path::PathBuf>,
}

fn prepare(engine: &EngineArgs, quiet: bool, handler: &ShutdownHandler) -> Result<Prepared> {
    let roots = normalize_roots(&engine.paths);
    if roots.is_empty() {
        bail!(
            "No directory to scan: none of {} given path(s) is an existing directory",
            engine.paths.len()
        );
    }
    if roots.len() < engine.paths.len() {
        log::warn!(
            "Scanning {} of {} given paths (missing, not a directory, or nested in another root)",
            roots.len(),
            engine.paths.len()
        );
    }

    let base = match &engine.config {
        Some(path) => Config::load_from(Some(path))
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load(),
    };
    let config = engine.apply(base);
    log::debug!("Effective configuration: {:?}", config);

    let mut finder_config = config
        .finder_config()
        .with_shutdown_flag(handler.get_flag());
    if !quiet && !engine.no_progress {
        finder_config = finder_config.with_progress_callback(Arc::new(Progress::new(false)));
    }

    Ok(Prepared {
        finder: DuplicateFinder::new(config.strategy, finder_config),
        strategy: config.strategy,
        roots,
    })
}

fn run_scan(args: &ScanArgs, quiet: bool, handler: &ShutdownHandler) -> Result<ExitCode> {
    let prepared = prepare(&args.engine, quiet, handler)?;
    let start = Instant::now();
    let (groups, summary) = prepared.finder.find_duplicates(&prepared.roots)?;
    let exit_code = ExitCode::for_scan(groups.len(), &summary);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Text => TextOutput::new(&groups, &summary).write_to(&mut out)?,
        OutputFormat::Json => {
            let json_summary =
                JsonSummary::new(prepared.strategy, &summary, start.elapsed(), exit_code);
            JsonOutput::new(&groups, json_summary).write_to(&mut out)?;
        }
    }
    out.flush()?;
    Ok(exit_code)
}

fn run_candidates(args: &CandidatesArgs, quiet: bool, handler: &ShutdownHandler) -> Result<ExitCode> {
    let prepared = prepare(&args.engine, quiet, handler)?;
    let start = Instant::now();
    let (mut candidates, summary) = prepared
        .finder
        .collect_candidates(&prepared.roots, Vec::<FileRef>::new())?;
    candidates.sort_by(|a, b| a.path.cmp(&b.path));
    // A candidate is a potential duplicate, so an empty list maps to "no duplicates"
    let exit_code = ExitCode::for_scan(candidates.len(), &summary);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Text => output::text::write_candidates(&mut out, &candidates)?,
        OutputFormat::Json => {
            let json_summary =
                JsonSummary::new(prepared.strategy, &summary, start.elapsed(), exit_code);
            JsonCandidates::new(&candidates, json_summary).write_to(&mut out)?;
        }
    }
    out.flush()?;
    Ok(exit_code)
}
