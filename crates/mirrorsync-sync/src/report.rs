//! Per-cycle outcome reporting

use crate::diff::WriteKind;
use crate::indexer::ScanFailure;
use chrono::{DateTime, Utc};
use mirrorsync_types::{Error, RelativePath};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Operation attempted on a replica path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncAction {
    /// File copied into the replica for the first time
    Create,
    /// Replica file overwritten with new content
    Update,
    /// Replica file removed
    Delete,
}

impl From<WriteKind> for SyncAction {
    fn from(kind: WriteKind) -> Self {
        match kind {
            WriteKind::Create => Self::Create,
            WriteKind::Update => Self::Update,
        }
    }
}

/// How an operation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The replica was changed
    Applied,
    /// Dry run: the operation was only reported
    DryRun,
    /// Delete withheld because the source path could not be scanned
    Held,
    /// The operation failed
    Failed(Error),
}

/// Outcome of one operation on one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathOutcome {
    /// Replica-relative path
    pub path: RelativePath,
    /// Attempted operation
    pub action: SyncAction,
    /// Result
    pub outcome: Outcome,
}

/// Everything that happened during one cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Cycle identifier
    pub cycle_id: Uuid,
    /// Wall-clock start of the cycle
    pub started_at: DateTime<Utc>,
    /// Time from start to completion
    pub duration: Duration,
    /// Files indexed in the source
    pub source_files: usize,
    /// Files indexed in the replica before applying
    pub replica_files: usize,
    /// Bytes written into the replica
    pub bytes_copied: u64,
    /// Entries that could not be indexed, in either tree
    pub scan_failures: Vec<ScanFailure>,
    /// Per-path operation outcomes, writes first
    pub outcomes: Vec<PathOutcome>,
}

impl CycleReport {
    /// Create an empty report starting now
    pub fn new() -> Self {
        Self {
            cycle_id: Uuid::new_v4(),
            started_at: Utc::now(),
            duration: Duration::ZERO,
            source_files: 0,
            replica_files: 0,
            bytes_copied: 0,
            scan_failures: Vec::new(),
            outcomes: Vec::new(),
        }
    }

    /// Record the outcome of an operation
    pub fn record(&mut self, path: RelativePath, action: SyncAction, outcome: Outcome) {
        self.outcomes.push(PathOutcome {
            path,
            action,
            outcome,
        });
    }

    fn applied(&self, action: SyncAction) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.action == action && o.outcome == Outcome::Applied)
            .count()
    }

    /// Files created in the replica
    pub fn created(&self) -> usize {
        self.applied(SyncAction::Create)
    }

    /// Files updated in the replica
    pub fn updated(&self) -> usize {
        self.applied(SyncAction::Update)
    }

    /// Files deleted from the replica
    pub fn deleted(&self) -> usize {
        self.applied(SyncAction::Delete)
    }

    /// Operations reported but not performed in dry-run mode
    pub fn dry_run(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.outcome == Outcome::DryRun)
            .count()
    }

    /// Deletes withheld because of source scan failures
    pub fn held(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.outcome == Outcome::Held)
            .count()
    }

    /// Every error of the cycle, scan failures first
    pub fn errors(&self) -> impl Iterator<Item = &Error> {
        self.scan_failures
            .iter()
            .map(|failure| &failure.error)
            .chain(self.outcomes.iter().filter_map(|o| match &o.outcome {
                Outcome::Failed(error) => Some(error),
                _ => None,
            }))
    }

    /// Number of errors of the cycle
    pub fn failure_count(&self) -> usize {
        self.errors().count()
    }

    /// Whether the cycle finished without any failure or held delete
    ///
    /// A clean, non-dry-run cycle leaves the replica mirroring the source.
    pub fn is_clean(&self) -> bool {
        self.failure_count() == 0 && self.held() == 0
    }

    /// Counters for logging and display
    pub fn summary(&self) -> CycleSummary {
        CycleSummary {
            cycle_id: self.cycle_id,
            started_at: self.started_at,
            duration_ms: self.duration.as_millis() as u64,
            source_files: self.source_files,
            created: self.created(),
            updated: self.updated(),
            deleted: self.deleted(),
            dry_run: self.dry_run(),
            held: self.held(),
            failed: self.failure_count(),
            bytes_copied: self.bytes_copied,
        }
    }
}

impl Default for CycleReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters of one cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSummary {
    /// Cycle identifier
    pub cycle_id: Uuid,
    /// Wall-clock start of the cycle
    pub started_at: DateTime<Utc>,
    /// Cycle duration in milliseconds
    pub duration_ms: u64,
    /// Files indexed in the source
    pub source_files: usize,
    /// Files created
    pub created: usize,
    /// Files updated
    pub updated: usize,
    /// Files deleted
    pub deleted: usize,
    /// Operations only reported (dry run)
    pub dry_run: usize,
    /// Deletes withheld
    pub held: usize,
    /// Scan, copy and delete failures
    pub failed: usize,
    /// Bytes written into the replica
    pub bytes_copied: u64,
}
