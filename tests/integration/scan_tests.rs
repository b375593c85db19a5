use super::common::{create_mixed_tree, group_paths, write, ALL_STRATEGIES};
use dupscan::duplicates::{DuplicateFinder, FinderConfig};
use dupscan::scanner::DigestAlgorithm;
use std::collections::HashSet;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_scan_basic_example_every_strategy() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "A", "X".repeat(10));
    let b = write(dir.path(), "sub/B", "X".repeat(10));
    write(dir.path(), "C", "Y".repeat(10));
    write(dir.path(), "D", "Z".repeat(20));
    write(dir.path(), "E", "");

    for strategy in ALL_STRATEGIES {
        let finder = DuplicateFinder::new(strategy, FinderConfig::default());
        let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

        assert_eq!(group_paths(&groups), vec![vec![a.clone(), b.clone()]], "{strategy}");
        assert_eq!(groups[0].size, 10);
        assert_eq!(summary.files_seen, 5, "{strategy}");
        assert_eq!(summary.empty_files, 1, "{strategy}");
        assert_eq!(summary.candidates, 3, "{strategy}");
        assert_eq!(summary.reclaimable_space, 10, "{strategy}");
    }
}

#[test]
fn test_scan_three_identical_files() {
    let dir = tempdir().unwrap();
    let files: Vec<PathBuf> = ["x/one", "y/two", "three"]
        .iter()
        .map(|p| write(dir.path(), p, "identical"))
        .collect();

    for strategy in ALL_STRATEGIES {
        let finder = DuplicateFinder::new(strategy, FinderConfig::default());
        let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

        assert_eq!(groups.len(), 1, "{strategy}");
        let got: HashSet<_> = groups[0].paths().into_iter().collect();
        let want: HashSet<_> = files.iter().cloned().collect();
        assert_eq!(got, want, "{strategy}");
        assert_eq!(summary.duplicate_files, 2);
    }
}

#[test]
fn test_scan_mixed_tree() {
    let dir = tempdir().unwrap();
    create_mixed_tree(dir.path());

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(groups.len(), 2);
    // Largest reclaimable space first
    assert_eq!(groups[0].size, 20_000);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(groups[1].size, 17);
    assert_eq!(groups[1].len(), 3);

    assert_eq!(summary.files_seen, 11);
    assert_eq!(summary.empty_files, 2);
    assert_eq!(summary.candidates, 7);
    assert_eq!(summary.digested, 7);
    assert_eq!(summary.duplicate_groups, 2);
    assert_eq!(summary.duplicate_files, 3);
    assert_eq!(summary.reclaimable_space, 20_000 + 2 * 17);
    assert!(!summary.is_partial());
}

#[test]
fn test_every_group_shares_size_and_digest() {
    let dir = tempdir().unwrap();
    create_mixed_tree(dir.path());

    for digest in [DigestAlgorithm::Crc32, DigestAlgorithm::Blake3] {
        let config = FinderConfig::default().with_digest(digest);
        let finder = DuplicateFinder::new(Default::default(), config);
        let (groups, _) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

        for group in &groups {
            assert!(group.len() >= 2);
            for file in &group.files {
                assert_eq!(std::fs::metadata(&file.path).unwrap().len(), group.size);
                assert_eq!(std::fs::read(&file.path).unwrap(), std::fs::read(&group.files[0].path).unwrap());
            }
        }
    }
}

#[test]
fn test_no_file_in_two_groups() {
    let dir = tempdir().unwrap();
    create_mixed_tree(dir.path());
    for i in 0..5 {
        write(dir.path(), &format!("more/{i}.dat"), format!("payload-{}", i % 2));
    }

    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    let mut seen = HashSet::new();
    for group in &groups {
        for path in group.paths() {
            assert!(seen.insert(path.clone()), "{} listed twice", path.display());
        }
    }
}

#[test]
fn test_scan_is_idempotent() {
    let dir = tempdir().unwrap();
    create_mixed_tree(dir.path());

    for strategy in ALL_STRATEGIES {
        let finder = DuplicateFinder::new(strategy, FinderConfig::default());
        let roots = [dir.path().to_path_buf()];
        let (first, first_summary) = finder.find_duplicates(&roots).unwrap();
        let (second, second_summary) = finder.find_duplicates(&roots).unwrap();

        assert_eq!(group_paths(&first), group_paths(&second), "{strategy}");
        assert_eq!(first_summary.candidates, second_summary.candidates);
    }
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    for strategy in ALL_STRATEGIES {
        let finder = DuplicateFinder::new(strategy, FinderConfig::default());
        let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();
        assert!(groups.is_empty());
        assert_eq!(summary.files_seen, 0);
        assert_eq!(summary.directories, 1, "{strategy}");
    }
}

#[test]
fn test_only_empty_files_yield_no_groups() {
    let dir = tempdir().unwrap();
    for i in 0..4 {
        write(dir.path(), &format!("e{i}"), "");
    }
    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();
    assert!(groups.is_empty());
    assert_eq!(summary.empty_files, 4);
    assert_eq!(summary.candidates, 0);
}

#[test]
fn test_collect_candidates_returns_sink() {
    let dir = tempdir().unwrap();
    create_mixed_tree(dir.path());

    let finder = DuplicateFinder::with_defaults();
    let (paths, summary) = finder
        .collect_candidates(&[dir.path().to_path_buf()], Vec::<PathBuf>::new())
        .unwrap();

    assert_eq!(paths.len(), 7);
    assert_eq!(summary.candidates, 7);
    assert!(!paths.iter().any(|p| p.ends_with("unique-1.txt")));
    assert!(!paths.iter().any(|p| p.ends_with("empty1")));
}
