#[cfg(unix)]
mod unix {
    use super::super::common::{write, ALL_STRATEGIES};
    use dupscan::duplicates::{DuplicateFinder, FinderConfig};
    use std::os::unix::fs::symlink;
    use tempfile::tempdir;

    #[test]
    fn test_symlinks_not_followed_by_default() {
        let dir = tempdir().unwrap();
        let target = write(dir.path(), "real.txt", "linked content");
        symlink(&target, dir.path().join("link.txt")).unwrap();

        for strategy in ALL_STRATEGIES {
            let finder = DuplicateFinder::new(strategy, FinderConfig::default());
            let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();
            assert!(groups.is_empty(), "{strategy}");
            assert_eq!(summary.files_seen, 1, "{strategy}");
        }
    }

    #[test]
    fn test_followed_directory_link_is_walked() {
        let outside = tempdir().unwrap();
        write(outside.path(), "shared.bin", "shared bytes");
        let dir = tempdir().unwrap();
        write(dir.path(), "local.bin", "shared bytes");
        symlink(outside.path(), dir.path().join("mounted")).unwrap();

        for strategy in ALL_STRATEGIES {
            let config = FinderConfig::default().with_follow_symlinks(true);
            let finder = DuplicateFinder::new(strategy, config);
            let (groups, _) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();
            assert_eq!(groups.len(), 1, "{strategy}");
            assert_eq!(groups[0].len(), 2, "{strategy}");
        }
    }

    #[test]
    fn test_symlink_loop_terminates() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a/x", "loop test");
        write(dir.path(), "y", "loop test");
        symlink(dir.path().join("a"), dir.path().join("a").join("back")).unwrap();

        for strategy in ALL_STRATEGIES {
            let config = FinderConfig::default().with_follow_symlinks(true);
            let finder = DuplicateFinder::new(strategy, config);
            let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();
            assert_eq!(groups.len(), 1, "{strategy}");
            assert_eq!(groups[0].len(), 2, "{strategy}");
            assert_eq!(summary.skipped_entries, 1, "{strategy}");
        }
    }

    #[test]
    fn test_indirect_symlink_loop_terminates() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a/b/c/x", "deep loop");
        write(dir.path(), "y", "deep loop");
        // Two levels below its target
        symlink(dir.path().join("a"), dir.path().join("a/b/c/up")).unwrap();

        for strategy in ALL_STRATEGIES {
            let config = FinderConfig::default().with_follow_symlinks(true);
            let finder = DuplicateFinder::new(strategy, config);
            let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();
            assert_eq!(groups.len(), 1, "{strategy}");
            assert_eq!(groups[0].len(), 2, "{strategy}");
            assert_eq!(summary.files_seen, 2, "{strategy}");
            assert_eq!(summary.skipped_entries, 1, "{strategy}");
        }
    }
}
