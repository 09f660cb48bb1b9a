//! One full index, diff and apply pass

use crate::applicator::Applicator;
use crate::diff::DiffEngine;
use crate::indexer::TreeIndexer;
use crate::logger::{SyncEvent, SyncLogger};
use crate::report::{CycleReport, Outcome, SyncAction};
use mirrorsync_config::{Config, SyncSettings};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Mirrors a source root into a replica root, one pass per [`run`](Self::run)
///
/// Indices are rebuilt from scratch on every run, so a path that failed in
/// one cycle is retried by the next.
#[derive(Debug, Clone)]
pub struct SyncCycle {
    source: PathBuf,
    replica: PathBuf,
    indexer: TreeIndexer,
    diff_engine: DiffEngine,
    applicator: Applicator,
    logger: Arc<dyn SyncLogger>,
}

impl SyncCycle {
    /// Create a cycle with default settings
    pub fn new(
        source: impl Into<PathBuf>,
        replica: impl Into<PathBuf>,
        logger: Arc<dyn SyncLogger>,
    ) -> Self {
        Self::with_settings(source, replica, &SyncSettings::default(), logger)
    }

    /// Create a cycle with explicit settings
    pub fn with_settings(
        source: impl Into<PathBuf>,
        replica: impl Into<PathBuf>,
        settings: &SyncSettings,
        logger: Arc<dyn SyncLogger>,
    ) -> Self {
        Self {
            source: source.into(),
            replica: replica.into(),
            indexer: TreeIndexer::new().follow_symlinks(settings.follow_symlinks),
            diff_engine: DiffEngine::new(),
            applicator: Applicator::new(Arc::clone(&logger))
                .preserve_timestamps(settings.preserve_timestamps)
                .dry_run(settings.dry_run),
            logger,
        }
    }

    /// Create a cycle for the roots and settings of `config`
    pub fn from_config(config: &Config, logger: Arc<dyn SyncLogger>) -> Self {
        Self::with_settings(&config.source, &config.replica, &config.sync, logger)
    }

    /// Source root
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Replica root
    pub fn replica(&self) -> &Path {
        &self.replica
    }

    /// Run one pass and report what happened
    ///
    /// Per-path failures are recorded in the report; this never fails as a
    /// whole.
    pub fn run(&self) -> CycleReport {
        let started = Instant::now();
        let mut report = CycleReport::new();
        self.logger.record(&SyncEvent::CycleStarted {
            cycle_id: report.cycle_id,
            source: self.source.clone(),
            replica: self.replica.clone(),
        });

        let source = self.indexer.index(&self.source);
        let replica = self.indexer.index(&self.replica);
        for failure in source.failures.iter().chain(&replica.failures) {
            self.logger.record(&SyncEvent::Failed {
                path: failure.path.clone(),
                error: failure.error.clone(),
            });
        }

        let mut operations = self.diff_engine.diff(&source.index, &replica.index);

        // Unscanned source paths are not known to be gone
        let held = if source.root_failed() {
            operations.hold_all_deletes()
        } else {
            operations.hold_deletes_within(&source.failed_paths())
        };
        for path in held {
            self.logger
                .record(&SyncEvent::DeleteHeld { path: path.clone() });
            report.record(path, SyncAction::Delete, Outcome::Held);
        }

        report.source_files = source.index.len();
        report.replica_files = replica.index.len();
        report.scan_failures.extend(source.failures);
        report.scan_failures.extend(replica.failures);

        self.applicator
            .apply_into(&operations, &self.source, &self.replica, &mut report);

        report.duration = started.elapsed();
        self.logger.record(&SyncEvent::CycleFinished {
            summary: report.summary(),
        });
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemoryLogger;
    use mirrorsync_types::RelativePath;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, path: &str, content: &[u8]) {
        let full = root.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }

    #[test]
    fn test_cycle_events_bracket_operations() {
        let source = TempDir::new().unwrap();
        let replica = TempDir::new().unwrap();
        write(source.path(), "a.txt", b"hello");

        let logger = Arc::new(MemoryLogger::new());
        let report = SyncCycle::new(source.path(), replica.path(), logger.clone()).run();

        let events = logger.events();
        assert!(matches!(events.first(), Some(SyncEvent::CycleStarted { cycle_id, .. }) if *cycle_id == report.cycle_id));
        assert!(matches!(
            events.get(1),
            Some(SyncEvent::Created { path }) if *path == RelativePath::new("a.txt").unwrap()
        ));
        assert!(matches!(events.last(), Some(SyncEvent::CycleFinished { summary }) if summary.created == 1));
        assert_eq!(report.source_files, 1);
        assert_eq!(report.replica_files, 0);
    }

    #[test]
    fn test_missing_source_root_deletes_nothing() {
        let temp = TempDir::new().unwrap();
        let replica = TempDir::new().unwrap();
        write(replica.path(), "precious.txt", b"keep me");

        let logger = Arc::new(MemoryLogger::new());
        let report = SyncCycle::new(temp.path().join("unmounted"), replica.path(), logger).run();

        assert!(replica.path().join("precious.txt").exists());
        assert_eq!(report.held(), 1);
        assert_eq!(report.deleted(), 0);
        assert_eq!(report.failure_count(), 1);
    }

    #[test]
    fn test_missing_replica_root_is_created() {
        let source = TempDir::new().unwrap();
        let temp = TempDir::new().unwrap();
        write(source.path(), "x/y.txt", b"data");
        let replica = temp.path().join("fresh-replica");

        let report = SyncCycle::new(source.path(), &replica, Arc::new(MemoryLogger::new())).run();

        assert_eq!(report.created(), 1);
        assert_eq!(fs::read(replica.join("x/y.txt")).unwrap(), b"data");
    }

    #[test]
    fn test_settings_are_applied() {
        let source = TempDir::new().unwrap();
        let replica = TempDir::new().unwrap();
        write(source.path(), "a.txt", b"hello");
        let settings = SyncSettings {
            dry_run: true,
            ..SyncSettings::default()
        };

        let report = SyncCycle::with_settings(
            source.path(),
            replica.path(),
            &settings,
            Arc::new(MemoryLogger::new()),
        )
        .run();

        assert_eq!(report.dry_run(), 1);
        assert!(!replica.path().join("a.txt").exists());
    }
}
