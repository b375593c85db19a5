//! Root directory normalization.
//!
//! Roots handed to a scan may repeat, may be spelled differently
//! (`dir` vs `dir/.`), or may nest inside one another. Walking them as given
//! would classify the same file more than once. [`normalize_roots`] reduces
//! them to a set of disjoint, canonical directories.

use std::path::{Path, PathBuf};

/// Reduce roots to disjoint, canonical directories.
///
/// - Nonexistent paths and non-directories are dropped.
/// - Paths are canonicalized; if that fails the path is kept as given.
/// - Exact duplicates are removed.
/// - A root nested under another root is removed, since the outer walk
///   already covers it.
///
/// The result is sorted.
#[must_use]
pub fn normalize_roots<P: AsRef<Path>>(roots: &[P]) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = roots
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| {
            let is_dir = p.is_dir();
            if !is_dir {
                log::debug!("Skipping root that is not a directory: {}", p.display());
            }
            is_dir
        })
        .map(|p| match p.canonicalize() {
            Ok(canonical) => canonical,
            Err(e) => {
                log::debug!("Could not canonicalize {}: {}", p.display(), e);
                p.to_path_buf()
            }
        })
        .collect();

    // Sorting puts every parent immediately before its descendants
    dirs.sort();
    dirs.dedup();

    let mut disjoint: Vec<PathBuf> = Vec::with_capacity(dirs.len());
    for dir in dirs {
        match disjoint.last() {
            Some(outer) if dir.starts_with(outer) => {
                log::debug!(
                    "Skipping root {} nested under {}",
                    dir.display(),
                    outer.display()
                );
            }
            _ => disjoint.push(dir),
        }
    }
    disjoint
}
