//! Unreadable entries are skipped and counted; they never fail a scan.

#[cfg(unix)]
mod unix {
    use super::super::common::{write, ALL_STRATEGIES};
    use dupscan::duplicates::{DuplicateFinder, FinderConfig};
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tempfile::tempdir;

    fn set_mode(path: &Path, mode: u32) {
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    /// Permission bits do not stop root; such runs cannot exercise the error path.
    fn permissions_enforced(probe: &Path) -> bool {
        fs::read_dir(probe).is_err()
    }

    #[test]
    fn test_unreadable_directory_is_skipped() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.txt", "dup");
        write(dir.path(), "b.txt", "dup");
        let locked = dir.path().join("locked");
        write(&locked, "c.txt", "dup");
        set_mode(&locked, 0o000);

        if !permissions_enforced(&locked) {
            set_mode(&locked, 0o755);
            return;
        }

        for strategy in ALL_STRATEGIES {
            let finder = DuplicateFinder::new(strategy, FinderConfig::default());
            let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

            assert_eq!(groups.len(), 1, "{strategy}");
            assert_eq!(groups[0].len(), 2, "{strategy}");
            assert!(summary.skipped_entries >= 1, "{strategy}");
            assert!(summary.is_partial());
        }
        set_mode(&locked, 0o755);
    }

    #[test]
    fn test_unreadable_candidate_is_dropped() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.txt", "same bytes");
        write(dir.path(), "b.txt", "same bytes");
        let secret = write(dir.path(), "c.txt", "same bytes");
        set_mode(&secret, 0o000);

        if fs::read(&secret).is_ok() {
            set_mode(&secret, 0o644);
            return;
        }

        for strategy in ALL_STRATEGIES {
            let finder = DuplicateFinder::new(strategy, FinderConfig::default());
            let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

            // Still a candidate by size, but never digested
            assert_eq!(summary.candidates, 3, "{strategy}");
            assert_eq!(summary.digest_failures, 1, "{strategy}");
            assert_eq!(groups.len(), 1);
            assert!(!groups[0].paths().contains(&secret));
        }
        set_mode(&secret, 0o644);
    }
}

use super::common::write;
use dupscan::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_cancelled_scan_reports_interrupted() {
    let dir = tempdir().unwrap();
    for i in 0..20 {
        write(dir.path(), &format!("d{}/f{i}", i % 4), format!("{}", i % 3));
    }

    for strategy in super::common::ALL_STRATEGIES {
        let flag = Arc::new(AtomicBool::new(true));
        let config = FinderConfig::default().with_shutdown_flag(flag);
        let result = DuplicateFinder::new(strategy, config).find_duplicates(&[dir.path().to_path_buf()]);
        assert!(matches!(result, Err(FinderError::Interrupted)), "{strategy}");
    }
}
