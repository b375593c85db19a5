//! Human-readable output.

use std::io::{self, Write};

use bytesize::ByteSize;

use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::scanner::FileRef;

/// Plain-text listing of duplicate groups.
pub struct TextOutput<'a> {
    groups: &'a [DuplicateGroup],
    summary: &'a ScanSummary,
}

impl<'a> TextOutput<'a> {
    /// Create a text formatter.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup], summary: &'a ScanSummary) -> Self {
        Self { groups, summary }
    }

    /// Write every group, then a summary block.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for (i, group) in self.groups.iter().enumerate() {
            writeln!(
                writer,
                "Group {}: {} files, {} each, digest {} ({} reclaimable)",
                i + 1,
                group.len(),
                ByteSize::b(group.size),
                group.digest_hex(),
                ByteSize::b(group.wasted_space()),
            )?;
            for file in &group.files {
                writeln!(writer, "  {}", file.path.display())?;
            }
            writeln!(writer)?;
        }
        write_summary(writer, self.summary)
    }
}

/// Plain-text listing of candidates, one path per line.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_candidates<W: Write>(writer: &mut W, candidates: &[FileRef]) -> io::Result<()> {
    for file in candidates {
        writeln!(writer, "{}", file.path.display())?;
    }
    Ok(())
}

/// Write the counters block.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_summary<W: Write>(writer: &mut W, summary: &ScanSummary) -> io::Result<()> {
    writeln!(
        writer,
        "{} files in {} directories, {} size candidates, {} digested",
        summary.files_seen, summary.directories, summary.candidates, summary.digested
    )?;
    if summary.duplicate_groups > 0 {
        writeln!(
            writer,
            "{} duplicate groups, {} duplicate files, {} reclaimable",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display()
        )?;
    }
    if summary.is_partial() {
        writeln!(
            writer,
            "Warning: {} entries skipped, {} files unreadable; results may be incomplete",
            summary.skipped_entries, summary.digest_failures
        )?;
    }
    Ok(())
}
