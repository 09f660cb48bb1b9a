//! Difference detection between two tree indices

use crate::indexer::TreeIndex;
use mirrorsync_types::RelativePath;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Why a path has to be written to the replica
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WriteKind {
    /// Path is missing from the replica
    Create,
    /// Replica content differs from the source
    Update,
}

/// Operations that bring a replica in line with its source
///
/// `writes` and `deletes` never share a path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationSet {
    writes: BTreeMap<RelativePath, WriteKind>,
    deletes: BTreeSet<RelativePath>,
}

impl OperationSet {
    /// Paths to create or update, with the reason
    pub fn writes(&self) -> impl Iterator<Item = (&RelativePath, WriteKind)> {
        self.writes.iter().map(|(path, kind)| (path, *kind))
    }

    /// Paths to remove from the replica
    pub fn deletes(&self) -> impl Iterator<Item = &RelativePath> {
        self.deletes.iter()
    }

    /// Whether `path` is scheduled for writing
    pub fn write_kind(&self, path: &RelativePath) -> Option<WriteKind> {
        self.writes.get(path).copied()
    }

    /// Whether `path` is scheduled for removal
    pub fn is_delete(&self, path: &RelativePath) -> bool {
        self.deletes.contains(path)
    }

    /// Number of creates
    pub fn create_count(&self) -> usize {
        self.writes
            .values()
            .filter(|kind| **kind == WriteKind::Create)
            .count()
    }

    /// Number of updates
    pub fn update_count(&self) -> usize {
        self.writes
            .values()
            .filter(|kind| **kind == WriteKind::Update)
            .count()
    }

    /// Number of deletes
    pub fn delete_count(&self) -> usize {
        self.deletes.len()
    }

    /// Total number of operations
    pub fn len(&self) -> usize {
        self.writes.len() + self.deletes.len()
    }

    /// Whether the replica already mirrors the source
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty() && self.deletes.is_empty()
    }

    /// Drop deletes that equal or lie under any of `scopes`, returning them
    ///
    /// Used for source paths that failed to scan: their absence from the
    /// source index does not mean they were removed.
    pub fn hold_deletes_within(&mut self, scopes: &[RelativePath]) -> Vec<RelativePath> {
        if scopes.is_empty() {
            return Vec::new();
        }

        let (held, kept): (BTreeSet<_>, BTreeSet<_>) = std::mem::take(&mut self.deletes)
            .into_iter()
            .partition(|path| scopes.iter().any(|scope| path.is_within(scope)));
        self.deletes = kept;
        held.into_iter().collect()
    }

    /// Drop every delete, returning them
    pub fn hold_all_deletes(&mut self) -> Vec<RelativePath> {
        std::mem::take(&mut self.deletes).into_iter().collect()
    }
}

/// Engine for detecting differences between a source and a replica index
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffEngine;

impl DiffEngine {
    /// Create a new diff engine
    pub fn new() -> Self {
        Self
    }

    /// Compare two indices
    ///
    /// A source path absent from the replica is a create, a source path with
    /// a different replica digest is an update, and a replica path absent
    /// from the source is a delete. Renames show up as delete + create.
    pub fn diff(&self, source: &TreeIndex, replica: &TreeIndex) -> OperationSet {
        let mut operations = OperationSet::default();

        for (path, digest) in source {
            match replica.get(path) {
                None => {
                    operations.writes.insert(path.clone(), WriteKind::Create);
                }
                Some(replica_digest) if replica_digest != digest => {
                    operations.writes.insert(path.clone(), WriteKind::Update);
                }
                Some(_) => {}
            }
        }

        for path in replica.paths() {
            if !source.contains(path) {
                operations.deletes.insert(path.clone());
            }
        }

        debug!(
            "Diff: {} creates, {} updates, {} deletes",
            operations.create_count(),
            operations.update_count(),
            operations.delete_count()
        );
        operations
    }
}
