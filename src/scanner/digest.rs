//! Streaming 64-bit content digests.
//!
//! # Overview
//!
//! [`ContentDigest`] reads a file's full byte stream through a fixed 8 KiB
//! buffer and folds it into a 64-bit value. The digest is the engine's only
//! equality oracle: two files with the same size and the same digest are
//! reported as duplicates without a byte-level comparison.
//!
//! Two algorithms are available:
//! - [`DigestAlgorithm::Crc32`] (default): CRC-32 widened to 64 bits. Fast,
//!   but with a real collision probability on large trees.
//! - [`DigestAlgorithm::Blake3`]: the first 8 bytes of the BLAKE3 hash.
//!
//! # Example
//!
//! ```no_run
//! use dupscan::scanner::{ContentDigest, DigestAlgorithm};
//! use std::path::Path;
//!
//! let digest = ContentDigest::new(DigestAlgorithm::Crc32);
//! let value = digest.digest(Path::new("Cargo.toml")).unwrap();
//! println!("{:016x}", value);
//! ```

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::DigestError;

/// Read buffer size for digesting.
pub const BUFFER_SIZE: usize = 8 * 1024;

/// Digest algorithm used as the content equality oracle.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// CRC-32, widened to 64 bits
    #[default]
    Crc32,
    /// BLAKE3, truncated to 64 bits
    Blake3,
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Crc32 => write!(f, "crc32"),
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

/// Running state for one digest computation.
enum Accumulator {
    Crc32(crc32fast::Hasher),
    Blake3(Box<blake3::Hasher>),
}

impl Accumulator {
    fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Crc32 => Self::Crc32(crc32fast::Hasher::new()),
            DigestAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            Self::Crc32(h) => h.update(bytes),
            Self::Blake3(h) => {
                h.update(bytes);
            }
        }
    }

    fn finish(self) -> u64 {
        match self {
            Self::Crc32(h) => u64::from(h.finalize()),
            Self::Blake3(h) => {
                let hash = h.finalize();
                let mut head = [0u8; 8];
                head.copy_from_slice(&hash.as_bytes()[..8]);
                u64::from_le_bytes(head)
            }
        }
    }
}

/// Content digester.
///
/// Holds no per-file state; every call allocates its own buffer and
/// accumulator, so one instance can be shared by all digest workers.
#[derive(Debug, Clone, Default)]
pub struct ContentDigest {
    algorithm: DigestAlgorithm,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl ContentDigest {
    /// Create a digester for the given algorithm.
    #[must_use]
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self {
            algorithm,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag, checked between buffer reads.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The configured algorithm.
    #[must_use]
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Compute the digest of a file's full content.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError`] if the file cannot be opened or read, or if
    /// shutdown is requested part way through.
    pub fn digest(&self, path: &Path) -> Result<u64, DigestError> {
        let mut file = File::open(path).map_err(|e| DigestError::from_io(path, e))?;
        let mut accumulator = Accumulator::new(self.algorithm);
        let mut buffer = [0u8; BUFFER_SIZE];

        loop {
            if self.is_shutdown_requested() {
                return Err(DigestError::Interrupted(path.to_path_buf()));
            }
            match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => accumulator.update(&buffer[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(DigestError::from_io(path, e)),
            }
        }

        Ok(accumulator.finish())
    }

    /// Compare two files by size, then by digest.
    ///
    /// Files of different size are reported different without reading
    /// either of them.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError`] if either file cannot be inspected.
    pub fn same_content(&self, a: &Path, b: &Path) -> Result<bool, DigestError> {
        if a == b {
            return Ok(true);
        }
        let size_a = std::fs::metadata(a)
            .map_err(|e| DigestError::from_io(a, e))?
            .len();
        let size_b = std::fs::metadata(b)
            .map_err(|e| DigestError::from_io(b, e))?
            .len();
        if size_a != size_b {
            return Ok(false);
        }
        Ok(self.digest(a)? == self.digest(b)?)
    }
}

/// Format a digest as a fixed-width hexadecimal string.
#[must_use]
pub fn digest_to_hex(digest: u64) -> String {
    format!("{digest:016x}")
}
