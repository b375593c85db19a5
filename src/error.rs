//! Exit codes and structured error output for the binary.

use serde::Serialize;

use crate::duplicates::{FinderError, ScanSummary};

/// Process exit codes.
///
/// - 0: duplicates found
/// - 1: unexpected failure
/// - 2: scan completed, no duplicates
/// - 3: scan completed, but some entries or candidates could not be read
/// - 130: interrupted by Ctrl+C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Scan completed and duplicates were found.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// Scan completed but no duplicates were found.
    NoDuplicates = 2,
    /// Scan completed with a partial view of the tree.
    PartialSuccess = 3,
    /// Scan was interrupted by the user.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DS000",
            Self::GeneralError => "DS001",
            Self::NoDuplicates => "DS002",
            Self::PartialSuccess => "DS003",
            Self::Interrupted => "DS130",
        }
    }

    /// Exit code for a completed scan.
    ///
    /// A partial view wins over the duplicates/no-duplicates distinction:
    /// the caller cannot trust "no duplicates" when entries were skipped.
    #[must_use]
    pub fn for_scan(duplicate_groups: usize, summary: &ScanSummary) -> Self {
        if summary.is_partial() {
            Self::PartialSuccess
        } else if duplicate_groups == 0 {
            Self::NoDuplicates
        } else {
            Self::Success
        }
    }

    /// Exit code for an error escaping `run_app`.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        if err
            .downcast_ref::<FinderError>()
            .is_some_and(|e| matches!(e, FinderError::Interrupted))
        {
            Self::Interrupted
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
