//! JSON output formatter for scan results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "digest": "00000000cbf43926",
//!       "size": 1024,
//!       "files": ["/path/to/file1.txt", "/path/to/file2.txt"]
//!     }
//!   ],
//!   "summary": {
//!     "strategy": "pipelined",
//!     "files_seen": 100,
//!     "candidates": 12,
//!     "duplicate_groups": 5,
//!     "reclaimable_space": 51200,
//!     "scan_duration_ms": 1234,
//!     "exit_code": 0,
//!     "exit_code_name": "DS000"
//!   }
//! }
//! ```
//!
//! The summary carries every [`ScanSummary`] counter; the schema above is
//! abbreviated.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::duplicates::{DuplicateGroup, ScanStrategy, ScanSummary};
use crate::error::ExitCode;
use crate::scanner::FileRef;

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// 64-bit digest as 16 hex characters
    pub digest: String,
    /// File size in bytes
    pub size: u64,
    /// Paths of all files in the group
    pub files: Vec<String>,
}

impl From<&DuplicateGroup> for JsonDuplicateGroup {
    fn from(group: &DuplicateGroup) -> Self {
        Self {
            digest: group.digest_hex(),
            size: group.size,
            files: group.files.iter().map(|f| path_string(&f.path)).collect(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Strategy that produced the result
    pub strategy: ScanStrategy,
    /// Engine counters
    #[serde(flatten)]
    pub counters: ScanSummary,
    /// Wall-clock duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DS000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary.
    #[must_use]
    pub fn new(
        strategy: ScanStrategy,
        summary: &ScanSummary,
        duration: Duration,
        exit_code: ExitCode,
    ) -> Self {
        Self {
            strategy,
            counters: summary.clone(),
            scan_duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output for `scan`.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// List of duplicate groups
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Scan summary statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Create the output from duplicate groups and a summary.
    #[must_use]
    pub fn new(groups: &[DuplicateGroup], summary: JsonSummary) -> Self {
        Self {
            duplicates: groups.iter().map(JsonDuplicateGroup::from).collect(),
            summary,
        }
    }

    /// Write pretty-printed JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonOutputError> {
        write_json(self, writer)
    }
}

/// Complete JSON output for `candidates`.
#[derive(Debug, Clone, Serialize)]
pub struct JsonCandidates {
    /// Every file that shares its size with another file
    pub candidates: Vec<JsonCandidate>,
    /// Traversal statistics
    pub summary: JsonSummary,
}

/// A single candidate file.
#[derive(Debug, Clone, Serialize)]
pub struct JsonCandidate {
    /// Path of the file
    pub path: String,
    /// Size observed during traversal
    pub size: u64,
}

impl JsonCandidates {
    /// Create the output from collected candidates.
    #[must_use]
    pub fn new(candidates: &[FileRef], summary: JsonSummary) -> Self {
        Self {
            candidates: candidates
                .iter()
                .map(|f| JsonCandidate {
                    path: path_string(&f.path),
                    size: f.size,
                })
                .collect(),
            summary,
        }
    }

    /// Write pretty-printed JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonOutputError> {
        write_json(self, writer)
    }
}

fn write_json<T: Serialize, W: Write>(value: &T, writer: &mut W) -> Result<(), JsonOutputError> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writer.write_all(b"\n")?;
    Ok(())
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
