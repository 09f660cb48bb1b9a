//! Logger capability injected into the sync cycle
//!
//! The engine never writes log output itself; it hands [`SyncEvent`]s to a
//! [`SyncLogger`]. [`TracingLogger`] forwards them to `tracing`,
//! [`MemoryLogger`] keeps them for inspection.

use crate::report::{CycleSummary, SyncAction};
use mirrorsync_types::{Error, RelativePath};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// Importance of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventLevel {
    /// Normal progress
    Info,
    /// Degraded but successful
    Warn,
    /// A path could not be processed
    Error,
}

/// Semantic event emitted during a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A cycle began
    CycleStarted {
        /// Cycle identifier
        cycle_id: Uuid,
        /// Source root
        source: PathBuf,
        /// Replica root
        replica: PathBuf,
    },
    /// A file was copied into the replica for the first time
    Created {
        /// Replica-relative path
        path: RelativePath,
    },
    /// A replica file was overwritten with new content
    Updated {
        /// Replica-relative path
        path: RelativePath,
    },
    /// A replica file was removed
    Deleted {
        /// Replica-relative path
        path: RelativePath,
    },
    /// Dry run: an operation that would have been applied
    Planned {
        /// Replica-relative path
        path: RelativePath,
        /// Operation that was skipped
        action: SyncAction,
    },
    /// A delete was withheld because the source path failed to scan
    DeleteHeld {
        /// Replica-relative path
        path: RelativePath,
    },
    /// Content was written but the modification time could not be copied
    TimestampNotPreserved {
        /// Replica-relative path
        path: RelativePath,
        /// Underlying failure
        reason: String,
    },
    /// A path could not be scanned, copied or deleted
    Failed {
        /// Affected path, `None` for a tree root
        path: Option<RelativePath>,
        /// What went wrong
        error: Error,
    },
    /// A cycle completed
    CycleFinished {
        /// Counters of the cycle
        summary: CycleSummary,
    },
}

impl SyncEvent {
    /// Importance of the event
    pub fn level(&self) -> EventLevel {
        match self {
            Self::Failed { .. } => EventLevel::Error,
            Self::DeleteHeld { .. } | Self::TimestampNotPreserved { .. } => EventLevel::Warn,
            Self::CycleFinished { summary } if summary.failed > 0 => EventLevel::Warn,
            _ => EventLevel::Info,
        }
    }

    /// Path the event is about, if any
    pub fn path(&self) -> Option<&RelativePath> {
        match self {
            Self::Created { path }
            | Self::Updated { path }
            | Self::Deleted { path }
            | Self::Planned { path, .. }
            | Self::DeleteHeld { path }
            | Self::TimestampNotPreserved { path, .. } => Some(path),
            Self::Failed { path, .. } => path.as_ref(),
            Self::CycleStarted { .. } | Self::CycleFinished { .. } => None,
        }
    }
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CycleStarted {
                source, replica, ..
            } => write!(
                f,
                "Synchronizing {} -> {}",
                source.display(),
                replica.display()
            ),
            Self::Created { path } => write!(f, "Created file: {}", path),
            Self::Updated { path } => write!(f, "Updated file: {}", path),
            Self::Deleted { path } => write!(f, "Deleted file: {}", path),
            Self::Planned { path, action } => write!(f, "Would {:?} file: {}", action, path),
            Self::DeleteHeld { path } => {
                write!(f, "Keeping file: {} (source could not be scanned)", path)
            }
            Self::TimestampNotPreserved { path, reason } => {
                write!(f, "Could not preserve modification time of {}: {}", path, reason)
            }
            Self::Failed { error, .. } => write!(f, "{}", error),
            Self::CycleFinished { summary } => write!(
                f,
                "Cycle finished: {} created, {} updated, {} deleted, {} failed in {}ms",
                summary.created,
                summary.updated,
                summary.deleted,
                summary.failed,
                summary.duration_ms
            ),
        }
    }
}

/// Sink for sync events
pub trait SyncLogger: Send + Sync {
    /// Record one event
    fn record(&self, event: &SyncEvent);
}

impl fmt::Debug for dyn SyncLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn SyncLogger")
    }
}

/// Forwards events to the `tracing` subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl SyncLogger for TracingLogger {
    fn record(&self, event: &SyncEvent) {
        let path = event.path().map(ToString::to_string).unwrap_or_default();
        match event.level() {
            EventLevel::Info => tracing::info!(path = %path, "{}", event),
            EventLevel::Warn => tracing::warn!(path = %path, "{}", event),
            EventLevel::Error => tracing::error!(path = %path, "{}", event),
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct MemoryLogger {
    events: Mutex<Vec<SyncEvent>>,
}

impl MemoryLogger {
    /// Create an empty logger
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded events at or above `level`
    pub fn count_at_least(&self, level: EventLevel) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|event| event.level() >= level)
            .count()
    }

    /// Forget recorded events
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl SyncLogger for MemoryLogger {
    fn record(&self, event: &SyncEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl SyncLogger for NullLogger {
    fn record(&self, _event: &SyncEvent) {}
}
