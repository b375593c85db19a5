use super::common::{write, ALL_STRATEGIES};
use dupscan::duplicates::{DuplicateFinder, FinderConfig};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_scan_two_non_overlapping_directories() {
    let dir1 = tempdir().unwrap();
    let dir2 = tempdir().unwrap();
    write(dir1.path(), "a.txt", "dup");
    write(dir2.path(), "b.txt", "dup");

    for strategy in ALL_STRATEGIES {
        let finder = DuplicateFinder::new(strategy, FinderConfig::default());
        let (groups, summary) = finder
            .find_duplicates(&[dir1.path().to_path_buf(), dir2.path().to_path_buf()])
            .unwrap();

        assert_eq!(groups.len(), 1, "{strategy}");
        assert_eq!(groups[0].files.len(), 2);
        assert_eq!(summary.roots, 2);
        assert_eq!(summary.files_seen, 2);
    }
}

#[test]
fn test_scan_overlapping_directories() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    write(dir.path(), "a.txt", "content");
    write(&sub, "b.txt", "content");

    for strategy in ALL_STRATEGIES {
        let finder = DuplicateFinder::new(strategy, FinderConfig::default());
        // The nested root is dropped, so nothing is classified twice
        let (groups, summary) = finder
            .find_duplicates(&[dir.path().to_path_buf(), sub.clone()])
            .unwrap();

        assert_eq!(summary.roots, 1, "{strategy}");
        assert_eq!(summary.files_seen, 2, "{strategy}");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].files.len(), 2);
    }
}

#[test]
fn test_scan_same_root_twice() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", "same");
    write(dir.path(), "b", "same");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder
        .find_duplicates(&[dir.path().to_path_buf(), dir.path().join(".")])
        .unwrap();

    assert_eq!(summary.roots, 1);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
}

#[test]
fn test_missing_and_file_roots_are_skipped() {
    let dir = tempdir().unwrap();
    let file_root = write(dir.path(), "plain.txt", "not a dir");
    let scan_root = dir.path().join("scan");
    write(&scan_root, "x", "dup!");
    write(&scan_root, "y", "dup!");

    for strategy in ALL_STRATEGIES {
        let finder = DuplicateFinder::new(strategy, FinderConfig::default());
        let (groups, summary) = finder
            .find_duplicates(&[dir.path().join("missing"), file_root.clone(), scan_root.clone()])
            .unwrap();
        assert_eq!(summary.roots, 1, "{strategy}");
        assert_eq!(groups.len(), 1, "{strategy}");
    }
}

#[test]
fn test_cross_directory_duplicate_detection() {
    let dir1 = tempdir().unwrap();
    let dir2 = tempdir().unwrap();
    fs::create_dir_all(dir1.path().join("deep/er")).unwrap();
    write(dir1.path(), "deep/er/photo.jpg", vec![0xAB; 9000]);
    write(dir2.path(), "photo-copy.jpg", vec![0xAB; 9000]);
    write(dir2.path(), "photo-edit.jpg", vec![0xAC; 9000]);

    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder
        .find_duplicates(&[dir1.path().to_path_buf(), dir2.path().to_path_buf()])
        .unwrap();

    assert_eq!(groups.len(), 1);
    let names: Vec<String> = groups[0]
        .paths()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert!(names.contains(&"photo.jpg".to_string()));
    assert!(names.contains(&"photo-copy.jpg".to_string()));
}
