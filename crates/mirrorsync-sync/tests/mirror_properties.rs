//! End-to-end mirroring behaviour of full sync cycles

use mirrorsync_sync::{
    ContentHasher, CycleReport, EventLevel, MemoryLogger, Outcome, SyncAction, SyncCycle,
    SyncEvent, TreeIndexer,
};
use mirrorsync_config::SyncSettings;
use mirrorsync_types::{Error, RelativePath};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Create a file, including its parent directories
fn write_file(root: &Path, path: &str, content: &[u8]) {
    let full = root.join(path);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, content).unwrap();
}

/// Run one cycle with a fresh in-memory logger
fn run_cycle(source: &Path, replica: &Path) -> (CycleReport, Arc<MemoryLogger>) {
    let logger = Arc::new(MemoryLogger::new());
    let report = SyncCycle::new(source, replica, logger.clone()).run();
    (report, logger)
}

fn counts(report: &CycleReport) -> (usize, usize, usize) {
    (report.created(), report.updated(), report.deleted())
}

/// Both trees index to the same path/digest map
fn assert_mirrored(source: &Path, replica: &Path) {
    let indexer = TreeIndexer::new();
    let source_tree = indexer.index(source);
    let replica_tree = indexer.index(replica);
    assert!(source_tree.failures.is_empty());
    assert!(replica_tree.failures.is_empty());
    assert_eq!(source_tree.index, replica_tree.index);
}

fn rel(path: &str) -> RelativePath {
    RelativePath::new(path).unwrap()
}

#[test]
fn test_initial_copy_of_small_tree() {
    let source = TempDir::new().unwrap();
    let replica = TempDir::new().unwrap();
    write_file(source.path(), "a.txt", b"hello");
    write_file(source.path(), "b/c.txt", b"world");

    let (first, logger) = run_cycle(source.path(), replica.path());
    assert_eq!(counts(&first), (2, 0, 0));
    assert_eq!(fs::read(replica.path().join("a.txt")).unwrap(), b"hello");
    assert_eq!(fs::read(replica.path().join("b/c.txt")).unwrap(), b"world");
    assert!(logger.events().contains(&SyncEvent::Created { path: rel("b/c.txt") }));

    let (second, _) = run_cycle(source.path(), replica.path());
    assert_eq!(counts(&second), (0, 0, 0));
}

#[test]
fn test_convergence_from_arbitrary_replica() {
    let source = TempDir::new().unwrap();
    let replica = TempDir::new().unwrap();
    write_file(source.path(), "keep.txt", b"same");
    write_file(source.path(), "docs/readme.md", b"# new readme");
    write_file(source.path(), "deep/er/still/file.bin", &[0u8, 1, 2, 3, 255]);
    write_file(source.path(), "empty.txt", b"");
    write_file(replica.path(), "keep.txt", b"same");
    write_file(replica.path(), "docs/readme.md", b"# old readme");
    write_file(replica.path(), "orphan.txt", b"nobody wants me");
    write_file(replica.path(), "old/tree/gone.txt", b"stale");

    let (report, _) = run_cycle(source.path(), replica.path());

    assert!(report.is_clean());
    assert_eq!(counts(&report), (2, 1, 2));
    assert_mirrored(source.path(), replica.path());
}

#[test]
fn test_second_cycle_is_idempotent() {
    let source = TempDir::new().unwrap();
    let replica = TempDir::new().unwrap();
    write_file(source.path(), "one.txt", b"1");
    write_file(source.path(), "nested/two.txt", b"2");
    write_file(replica.path(), "extra.txt", b"x");

    run_cycle(source.path(), replica.path());
    let before = fs::metadata(replica.path().join("one.txt"))
        .unwrap()
        .modified()
        .unwrap();

    let (report, logger) = run_cycle(source.path(), replica.path());

    assert!(report.outcomes.is_empty());
    assert_eq!(report.bytes_copied, 0);
    let after = fs::metadata(replica.path().join("one.txt"))
        .unwrap()
        .modified()
        .unwrap();
    assert_eq!(before, after);
    assert!(logger
        .events()
        .iter()
        .all(|event| matches!(event, SyncEvent::CycleStarted { .. } | SyncEvent::CycleFinished { .. })));
}

#[test]
fn test_single_modification_is_one_update() {
    let source = TempDir::new().unwrap();
    let replica = TempDir::new().unwrap();
    write_file(source.path(), "a.txt", b"hello");
    write_file(source.path(), "b/c.txt", b"world");
    run_cycle(source.path(), replica.path());

    write_file(source.path(), "b/c.txt", b"world, revised");
    let (report, _) = run_cycle(source.path(), replica.path());

    assert_eq!(counts(&report), (0, 1, 0));
    assert_eq!(report.outcomes[0].path, rel("b/c.txt"));
    assert_eq!(
        fs::read(replica.path().join("b/c.txt")).unwrap(),
        b"world, revised"
    );
}

#[test]
fn test_same_size_change_is_detected() {
    let source = TempDir::new().unwrap();
    let replica = TempDir::new().unwrap();
    write_file(source.path(), "fixed.dat", b"AAAA");
    write_file(replica.path(), "fixed.dat", b"AAAB");

    let (report, _) = run_cycle(source.path(), replica.path());

    assert_eq!(counts(&report), (0, 1, 0));
    assert_eq!(
        ContentHasher::new()
            .digest(&replica.path().join("fixed.dat"))
            .unwrap(),
        ContentHasher::digest_bytes(b"AAAA")
    );
}

#[test]
fn test_source_removal_propagates() {
    let source = TempDir::new().unwrap();
    let replica = TempDir::new().unwrap();
    write_file(source.path(), "a.txt", b"hello");
    write_file(source.path(), "b/c.txt", b"world");
    run_cycle(source.path(), replica.path());

    fs::remove_file(source.path().join("b/c.txt")).unwrap();
    let (report, logger) = run_cycle(source.path(), replica.path());

    assert_eq!(counts(&report), (0, 0, 1));
    assert!(!replica.path().join("b/c.txt").exists());
    // Directories are not mirrored, so the emptied one stays
    assert!(replica.path().join("b").is_dir());
    assert!(logger.events().contains(&SyncEvent::Deleted { path: rel("b/c.txt") }));
}

#[test]
fn test_failed_copy_leaves_other_paths_mirrored() {
    let source = TempDir::new().unwrap();
    let replica = TempDir::new().unwrap();
    write_file(source.path(), "fine.txt", b"fine");
    write_file(source.path(), "blocked/file.txt", b"cannot land");
    // A regular file where the replica needs a directory
    write_file(replica.path(), "blocked", b"in the way");

    let (report, logger) = run_cycle(source.path(), replica.path());

    assert_eq!(report.created(), 1);
    assert!(replica.path().join("fine.txt").exists());
    let failed: Vec<_> = report
        .outcomes
        .iter()
        .filter(|o| matches!(o.outcome, Outcome::Failed(_)))
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].path, rel("blocked/file.txt"));
    assert_eq!(failed[0].action, SyncAction::Create);
    assert!(matches!(failed[0].outcome, Outcome::Failed(Error::Copy { .. })));
    assert!(logger.count_at_least(EventLevel::Error) >= 1);
}

#[test]
fn test_failed_path_is_retried_next_cycle() {
    let source = TempDir::new().unwrap();
    let replica = TempDir::new().unwrap();
    write_file(source.path(), "blocked/file.txt", b"eventually");
    write_file(replica.path(), "blocked", b"in the way");

    let (first, _) = run_cycle(source.path(), replica.path());
    assert_eq!(first.created(), 0);

    // The obstacle is deleted by the first cycle, the next one succeeds
    let (second, _) = run_cycle(source.path(), replica.path());
    assert_eq!(second.created(), 1);
    assert!(second.is_clean());
    assert_mirrored(source.path(), replica.path());
}

#[cfg(unix)]
#[test]
fn test_unscannable_source_file_keeps_replica_copy() {
    let source = TempDir::new().unwrap();
    let replica = TempDir::new().unwrap();
    write_file(source.path(), "good.txt", b"fine");
    std::os::unix::fs::symlink(
        source.path().join("missing-target"),
        source.path().join("broken.txt"),
    )
    .unwrap();
    write_file(replica.path(), "broken.txt", b"last good copy");

    let logger = Arc::new(MemoryLogger::new());
    let settings = SyncSettings {
        follow_symlinks: true,
        ..SyncSettings::default()
    };
    let report = SyncCycle::with_settings(source.path(), replica.path(), &settings, logger.clone()).run();

    assert_eq!(counts(&report), (1, 0, 0));
    assert_eq!(fs::read(replica.path().join("good.txt")).unwrap(), b"fine");
    assert_eq!(report.held(), 1);
    assert_eq!(report.scan_failures.len(), 1);
    assert_eq!(
        fs::read(replica.path().join("broken.txt")).unwrap(),
        b"last good copy"
    );
    assert!(logger.events().contains(&SyncEvent::DeleteHeld { path: rel("broken.txt") }));
}

#[cfg(unix)]
#[test]
fn test_replica_links_into_source_converge_without_touching_source() {
    let source = TempDir::new().unwrap();
    let replica = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    write_file(source.path(), "a.txt", b"original");
    write_file(source.path(), "b/c.txt", b"nested");
    std::os::unix::fs::symlink(source.path().join("a.txt"), replica.path().join("a.txt")).unwrap();
    std::os::unix::fs::symlink(outside.path(), replica.path().join("b")).unwrap();

    let (first, _) = run_cycle(source.path(), replica.path());
    assert!(first.is_clean());
    assert_eq!(fs::read(source.path().join("a.txt")).unwrap(), b"original");
    assert_eq!(fs::read_dir(outside.path()).unwrap().count(), 0);

    let (second, _) = run_cycle(source.path(), replica.path());
    assert_eq!(counts(&second), (0, 0, 0));
    assert_mirrored(source.path(), replica.path());
}

#[test]
fn test_missing_source_root_keeps_replica() {
    let temp = TempDir::new().unwrap();
    let replica = TempDir::new().unwrap();
    write_file(replica.path(), "a.txt", b"hello");
    write_file(replica.path(), "b/c.txt", b"world");

    let (report, logger) = run_cycle(&temp.path().join("not-mounted"), replica.path());

    assert_eq!(report.deleted(), 0);
    assert_eq!(report.held(), 2);
    assert!(matches!(
        report.scan_failures[0].error,
        Error::Scan { .. }
    ));
    assert!(replica.path().join("a.txt").exists());
    assert!(replica.path().join("b/c.txt").exists());
    assert!(logger.count_at_least(EventLevel::Warn) >= 3);
}
