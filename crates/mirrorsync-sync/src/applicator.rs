//! Applies an [`OperationSet`] to the replica tree

use crate::diff::{OperationSet, WriteKind};
use crate::logger::{SyncEvent, SyncLogger};
use crate::report::{CycleReport, Outcome, SyncAction};
use filetime::FileTime;
use mirrorsync_types::{Error, RelativePath, Result};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Executes create, update and delete operations against a replica
///
/// Every write finishes before the first delete starts. A failing
/// operation is recorded and the remaining ones still run.
#[derive(Debug, Clone)]
pub struct Applicator {
    preserve_timestamps: bool,
    dry_run: bool,
    logger: Arc<dyn SyncLogger>,
}

struct Written {
    bytes: u64,
    timestamp_error: Option<String>,
}

impl Applicator {
    /// Create an applicator that preserves modification times
    pub fn new(logger: Arc<dyn SyncLogger>) -> Self {
        Self {
            preserve_timestamps: true,
            dry_run: false,
            logger,
        }
    }

    /// Copy source modification times onto written files
    pub fn preserve_timestamps(mut self, preserve: bool) -> Self {
        self.preserve_timestamps = preserve;
        self
    }

    /// Report operations without touching the replica
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Apply `operations` and return a fresh report of the outcomes
    pub fn apply(
        &self,
        operations: &OperationSet,
        source_root: &Path,
        replica_root: &Path,
    ) -> CycleReport {
        let mut report = CycleReport::new();
        self.apply_into(operations, source_root, replica_root, &mut report);
        report
    }

    /// Apply `operations`, recording outcomes into `report`
    pub fn apply_into(
        &self,
        operations: &OperationSet,
        source_root: &Path,
        replica_root: &Path,
        report: &mut CycleReport,
    ) {
        for (path, kind) in operations.writes() {
            let action = SyncAction::from(kind);
            if self.dry_run {
                self.skip(path, action, report);
                continue;
            }

            let source = path.resolve(source_root);
            match self.write_file(&source, path, replica_root) {
                Ok(written) => {
                    report.bytes_copied += written.bytes;
                    report.record(path.clone(), action, Outcome::Applied);
                    self.logger.record(&match kind {
                        WriteKind::Create => SyncEvent::Created { path: path.clone() },
                        WriteKind::Update => SyncEvent::Updated { path: path.clone() },
                    });
                    if let Some(reason) = written.timestamp_error {
                        self.logger.record(&SyncEvent::TimestampNotPreserved {
                            path: path.clone(),
                            reason,
                        });
                    }
                }
                Err(error) => self.fail(path, action, error, report),
            }
        }

        for path in operations.deletes() {
            if self.dry_run {
                self.skip(path, SyncAction::Delete, report);
                continue;
            }

            let target = path.resolve(replica_root);
            match Self::delete_file(&target) {
                Ok(()) => {
                    report.record(path.clone(), SyncAction::Delete, Outcome::Applied);
                    self.logger
                        .record(&SyncEvent::Deleted { path: path.clone() });
                }
                Err(error) => self.fail(path, SyncAction::Delete, error, report),
            }
        }
    }

    fn skip(&self, path: &RelativePath, action: SyncAction, report: &mut CycleReport) {
        report.record(path.clone(), action, Outcome::DryRun);
        self.logger.record(&SyncEvent::Planned {
            path: path.clone(),
            action,
        });
    }

    fn fail(&self, path: &RelativePath, action: SyncAction, error: Error, report: &mut CycleReport) {
        self.logger.record(&SyncEvent::Failed {
            path: Some(path.clone()),
            error: error.clone(),
        });
        report.record(path.clone(), action, Outcome::Failed(error));
    }

    /// Copy one file into the replica through a temporary sibling
    ///
    /// The content lands under a temporary name and is renamed over the
    /// target, so an interrupted copy never leaves a truncated replica file
    /// and a symlink at the target is replaced rather than written through.
    fn write_file(&self, source: &Path, path: &RelativePath, replica_root: &Path) -> Result<Written> {
        let target = path.resolve(replica_root);
        let parent = Self::prepare_parent(path, replica_root)?;
        let temp = parent.join(Self::temp_name(&target));

        let bytes = fs::copy(source, &temp).map_err(|e| {
            Self::discard(&temp);
            Error::copy(
                &target,
                format!("failed to copy from '{}': {}", source.display(), e),
            )
        })?;

        let timestamp_error = if self.preserve_timestamps {
            Self::copy_mtime(source, &temp).err()
        } else {
            None
        };

        fs::rename(&temp, &target).map_err(|e| {
            Self::discard(&temp);
            Error::copy(&target, format!("failed to move into place: {}", e))
        })?;

        debug!("Copied: {} -> {}", source.display(), target.display());
        Ok(Written {
            bytes,
            timestamp_error,
        })
    }

    /// Make sure every directory between the replica root and the target is
    /// a real directory inside the replica
    ///
    /// Symlinks found on the way are removed and replaced by directories;
    /// the files they point at are never touched.
    fn prepare_parent(path: &RelativePath, replica_root: &Path) -> Result<PathBuf> {
        let segments: Vec<&OsStr> = path.segments().collect();
        let mut dir = replica_root.to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            Error::copy(
                path.resolve(replica_root),
                format!("failed to create directory '{}': {}", dir.display(), e),
            )
        })?;

        for segment in &segments[..segments.len().saturating_sub(1)] {
            dir.push(segment);
            let failed = |cause: String| {
                Error::copy(
                    path.resolve(replica_root),
                    format!("failed to create directory '{}': {}", dir.display(), cause),
                )
            };

            match fs::symlink_metadata(&dir) {
                Ok(metadata) if metadata.file_type().is_symlink() => {
                    Self::remove_link(&dir).map_err(|e| failed(e.to_string()))?;
                    debug!("Replaced symlink with directory: {}", dir.display());
                    fs::create_dir(&dir).map_err(|e| failed(e.to_string()))?;
                }
                Ok(metadata) if metadata.is_dir() => {}
                Ok(_) => return Err(failed("not a directory".to_string())),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    fs::create_dir(&dir).map_err(|e| failed(e.to_string()))?;
                }
                Err(e) => return Err(failed(e.to_string())),
            }
        }

        Ok(dir)
    }

    fn remove_link(link: &Path) -> io::Result<()> {
        // Directory links on Windows need remove_dir
        fs::remove_file(link).or_else(|_| fs::remove_dir(link))
    }

    fn temp_name(target: &Path) -> OsString {
        let mut name = OsString::from(".");
        name.push(target.file_name().unwrap_or_default());
        name.push(format!(".{}.mirrorsync-tmp", Uuid::new_v4().simple()));
        name
    }

    fn discard(temp: &Path) {
        if let Err(e) = fs::remove_file(temp) {
            if e.kind() != io::ErrorKind::NotFound {
                debug!("Could not remove temporary file {}: {}", temp.display(), e);
            }
        }
    }

    fn copy_mtime(source: &Path, target: &Path) -> std::result::Result<(), String> {
        let metadata = fs::metadata(source).map_err(|e| e.to_string())?;
        let modified = FileTime::from_last_modification_time(&metadata);
        filetime::set_file_mtime(target, modified).map_err(|e| e.to_string())
    }

    /// Remove one replica file; directories are left alone
    fn delete_file(target: &Path) -> Result<()> {
        fs::remove_file(target).map_err(|e| Error::delete(target, e))?;
        debug!("Deleted: {}", target.display());
        Ok(())
    }
}
