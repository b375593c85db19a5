//! Logging setup on the `log` facade with the `env_logger` backend.
//!
//! Log levels are determined by (in priority order):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (error only) or `--verbose` (debug/trace)
//! 3. Default: info level
//!
//! Debug builds add a timestamp and, with `-v`, the module path. Release
//! builds print level and message only.

use std::env;
use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Initialize logging from CLI verbosity flags.
///
/// Safe to call more than once: later calls leave the first logger in place.
/// This lets several `run_app` invocations share one test process.
///
/// # Example
///
/// ```rust,no_run
/// use dupscan::logging::init_logging;
///
/// init_logging(1, false);
/// log::debug!("Debug info here");
/// ```
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();
    let from_env = env::var("RUST_LOG").is_ok();
    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }
    configure_format(&mut builder, verbose);

    if builder.try_init().is_ok() {
        log::debug!(
            "Logging initialized at level {} ({})",
            current_level_name(),
            if from_env { "RUST_LOG" } else { "flags" }
        );
    }
}

/// Map CLI flags to a level filter.
///
/// * `verbose` - 0 = info, 1 = debug, 2+ = trace
/// * `quiet` - errors only, overrides `verbose`
#[must_use]
pub fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    {
        builder.format(move |buf, record| {
            let level = record.level();
            let style = buf.default_level_style(level);
            if verbose >= 1 {
                writeln!(
                    buf,
                    "{} {style}{:<5}{style:#} [{}] {}",
                    buf.timestamp_millis(),
                    level,
                    record.module_path().unwrap_or("unknown"),
                    record.args()
                )
            } else {
                writeln!(
                    buf,
                    "{} {style}{:<5}{style:#} {}",
                    buf.timestamp_seconds(),
                    level,
                    record.args()
                )
            }
        });
    }

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let level = record.level();
            let style = buf.default_level_style(level);
            writeln!(buf, "{style}{:<5}{style:#} {}", level, record.args())
        });
    }
}

/// Name of the currently active maximum level.
#[must_use]
pub fn current_level_name() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}
