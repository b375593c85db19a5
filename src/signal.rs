//! Ctrl+C handling for cooperative cancellation.
//!
//! A scan is cancelled by raising a shared `AtomicBool`. Walkers check it
//! before every entry, digesters before every buffer, and the strategies
//! before handing out new work, then return
//! [`FinderError::Interrupted`](crate::duplicates::FinderError::Interrupted).
//!
//! # Usage
//!
//! ```rust,no_run
//! use dupscan::duplicates::FinderConfig;
//! use dupscan::signal::install_handler;
//!
//! let handler = install_handler().expect("Failed to install signal handler");
//! let config = FinderConfig::default().with_shutdown_flag(handler.get_flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code for SIGINT (128 + 2).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Raise the flag, cancelling any scan that holds it.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The flag to hand to [`FinderConfig::with_shutdown_flag`](crate::duplicates::FinderConfig::with_shutdown_flag).
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Lower the flag so the handler can drive another scan.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C handler.
///
/// ctrlc accepts one handler per process, so the first call installs it and
/// later calls (several `run_app` invocations in one test binary) get the
/// same handler back with its flag lowered.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if the hook cannot be installed
/// and no handler exists yet. A hook that was already installed by someone
/// else is not an error: an unhooked handler is returned instead, which
/// still supports [`ShutdownHandler::request_shutdown`].
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();
    let installed = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "\nInterrupted. Finishing in-flight reads...");
        let _ = stderr.flush();
        log::info!("Shutdown signal received");
    });

    match installed {
        Ok(()) => Ok(GLOBAL_HANDLER.get_or_init(|| handler).clone()),
        Err(ctrlc::Error::MultipleHandlers) => {
            log::debug!("Ctrl+C handler already registered, using unhooked handler");
            let fallback = GLOBAL_HANDLER.get_or_init(ShutdownHandler::new);
            fallback.reset();
            Ok(fallback.clone())
        }
        Err(e) => Err(SignalError::InstallFailed(e)),
    }
}
