use super::common::{create_mixed_tree, group_paths, write, ALL_STRATEGIES};
use dupscan::duplicates::{build_scanner, DuplicateFinder, FinderConfig, ScanStrategy};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn create_wide_tree(root: &Path) {
    for d in 0..8 {
        for f in 0..6 {
            // Each of the six contents appears once per dirN
            let content = format!("file {} {}", f, "#".repeat(f * 3));
            write(root, &format!("dir{d}/sub{}/f{f}.txt", d % 3), &content);
        }
    }
}

#[test]
fn test_strategies_agree_on_groups() {
    let dir = tempdir().unwrap();
    create_mixed_tree(dir.path());
    create_wide_tree(&dir.path().join("wide"));
    let roots = [dir.path().to_path_buf()];

    let reference = DuplicateFinder::new(ScanStrategy::Sequential, FinderConfig::default())
        .find_duplicates(&roots)
        .unwrap();

    for strategy in [ScanStrategy::Hybrid, ScanStrategy::Pipelined] {
        let (groups, summary) = DuplicateFinder::new(strategy, FinderConfig::default())
            .find_duplicates(&roots)
            .unwrap();
        assert_eq!(group_paths(&groups), group_paths(&reference.0), "{strategy}");
        assert_eq!(summary.files_seen, reference.1.files_seen, "{strategy}");
        assert_eq!(summary.candidates, reference.1.candidates, "{strategy}");
        assert_eq!(summary.directories, reference.1.directories, "{strategy}");
    }
}

#[test]
fn test_strategies_agree_on_candidates() {
    let dir = tempdir().unwrap();
    create_mixed_tree(dir.path());
    create_wide_tree(&dir.path().join("wide"));
    let roots = [dir.path().to_path_buf()];

    let sets: Vec<BTreeSet<PathBuf>> = ALL_STRATEGIES
        .iter()
        .map(|&strategy| {
            let scanner = build_scanner(strategy, FinderConfig::default());
            let mut sink = BTreeSet::new();
            scanner.collect_candidates(&roots, &mut sink).unwrap();
            sink
        })
        .collect();

    assert!(!sets[0].is_empty());
    assert_eq!(sets[0], sets[1]);
    assert_eq!(sets[0], sets[2]);
}

#[test]
fn test_pipelined_thread_counts_do_not_change_result() {
    let dir = tempdir().unwrap();
    create_wide_tree(dir.path());
    let roots = [dir.path().to_path_buf()];

    let expected = DuplicateFinder::new(ScanStrategy::Sequential, FinderConfig::default())
        .find_duplicates(&roots)
        .unwrap()
        .0;
    assert_eq!(expected.len(), 6);

    for (traversal, digest) in [(1, 1), (1, 8), (8, 1), (3, 5), (16, 16)] {
        let config = FinderConfig::default()
            .with_traversal_threads(traversal)
            .with_digest_threads(digest);
        let (groups, summary) = DuplicateFinder::new(ScanStrategy::Pipelined, config)
            .find_duplicates(&roots)
            .unwrap();
        assert_eq!(
            group_paths(&groups),
            group_paths(&expected),
            "traversal={traversal} digest={digest}"
        );
        assert!(summary.walkers_created <= traversal);
        assert_eq!(
            summary.walkers_created + summary.walkers_reused,
            summary.directories
        );
    }
}

#[test]
fn test_small_shard_counts() {
    let dir = tempdir().unwrap();
    create_wide_tree(dir.path());
    let roots = [dir.path().to_path_buf()];

    for strategy in ALL_STRATEGIES {
        let config = FinderConfig::default().with_shards(1);
        let (groups, _) = DuplicateFinder::new(strategy, config)
            .find_duplicates(&roots)
            .unwrap();
        assert_eq!(groups.len(), 6, "{strategy}");
        assert!(groups.iter().all(|g| g.len() == 8));
    }
}
