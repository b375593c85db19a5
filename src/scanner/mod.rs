//! Scanner module for directory traversal and content digesting.
//!
//! This module provides the leaf I/O components of the duplicate engine:
//! - [`walker`]: one-walker-many-roots traversal with injected decisions
//! - [`digest`]: streaming 64-bit content digests
//! - [`roots`]: root directory normalization
//!
//! None of these hold shared state. Everything that several workers mutate
//! lives in [`crate::duplicates`].
//!
//! # Example
//!
//! ```no_run
//! use dupscan::scanner::{DirDecision, TreeWalker};
//! use std::path::Path;
//!
//! let mut walker = TreeWalker::new(Path::new("."));
//! walker
//!     .walk(
//!         |_dir| DirDecision::Descend,
//!         |file| println!("{}: {} bytes", file.path.display(), file.size),
//!         |err| eprintln!("Warning: {}", err),
//!     )
//!     .unwrap();
//! ```

pub mod digest;
pub mod roots;
pub mod walker;

use std::path::{Path, PathBuf};

use serde::Serialize;

pub use digest::{digest_to_hex, ContentDigest, DigestAlgorithm, BUFFER_SIZE};
pub use roots::normalize_roots;
pub use walker::{DirDecision, TreeWalker, WalkStats};

/// A file observed during traversal.
///
/// The size is the value read from the directory entry's metadata at the
/// moment the file was classified and is never refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FileRef {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileRef {
    /// Create a new FileRef.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }

    /// Whether the file has no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// Errors that can occur during directory traversal.
///
/// None of these abort a scan. The affected entry is skipped and the walk
/// continues with its siblings.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The path disappeared between listing and inspection.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// A component expecting a directory was handed something else.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing an entry.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A traversal failure without an underlying I/O error (e.g. a symlink loop).
    #[error("Walk error at {path}: {message}")]
    Walk {
        /// Path where the error occurred
        path: PathBuf,
        /// Description from the tree walk
        message: String,
    },
}

impl ScanError {
    /// Classify an I/O error raised for `path`.
    pub(crate) fn from_io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::NotADirectory(p) => p,
            Self::Io { path, .. } | Self::Walk { path, .. } => path,
        }
    }
}

impl From<walkdir::Error> for ScanError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        if let Some(ancestor) = err.loop_ancestor() {
            return Self::Walk {
                message: format!("symlink loop back to {}", ancestor.display()),
                path,
            };
        }
        let message = err.to_string();
        match err.into_io_error() {
            Some(io) => Self::from_io(&path, io),
            None => Self::Walk { path, message },
        }
    }
}

/// Errors that can occur while computing a content digest.
#[derive(thiserror::Error, Debug)]
pub enum DigestError {
    /// The file was removed after it was classified.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Shutdown was requested while the file was being read.
    #[error("Digest interrupted: {0}")]
    Interrupted(PathBuf),
}

impl DigestError {
    pub(crate) fn from_io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}
