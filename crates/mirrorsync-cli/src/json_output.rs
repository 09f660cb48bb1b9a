//! JSON output structures for the mirrorsync CLI

use mirrorsync_config::Config;
use mirrorsync_sync::{CycleReport, CycleSummary};
use mirrorsync_types::Error;
use serde::{Deserialize, Serialize};

/// Complete JSON output for a single cycle
#[derive(Debug, Serialize, Deserialize)]
pub struct CycleResultJson {
    /// Operation metadata
    pub metadata: OperationMetadata,
    /// Cycle counters
    pub summary: CycleSummary,
    /// Every failure of the cycle
    pub errors: Vec<ErrorJson>,
    /// Overall result
    pub result: OperationResult,
}

/// Operation metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct OperationMetadata {
    /// mirrorsync version
    pub version: String,
    /// Timestamp when the cycle started
    pub timestamp: String,
    /// Source path
    pub source_path: String,
    /// Replica path
    pub replica_path: String,
    /// Whether the replica was left untouched
    pub dry_run: bool,
}

/// A single failure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorJson {
    /// Error category
    pub kind: String,
    /// Affected path, if any
    pub path: Option<String>,
    /// Error message
    pub message: String,
}

impl From<&Error> for ErrorJson {
    fn from(error: &Error) -> Self {
        Self {
            kind: format!("{:?}", error.kind()),
            path: error.path().map(|path| path.display().to_string()),
            message: error.to_string(),
        }
    }
}

/// Overall operation result
#[derive(Debug, Serialize, Deserialize)]
pub struct OperationResult {
    /// Whether every operation succeeded
    pub success: bool,
    /// Human-readable message
    pub message: String,
}

impl CycleResultJson {
    /// Build the JSON view of `report`
    pub fn new(report: &CycleReport, config: &Config) -> Self {
        let summary = report.summary();
        let errors: Vec<ErrorJson> = report.errors().map(ErrorJson::from).collect();
        let success = report.is_clean();
        let message = if success {
            "Replica is in sync".to_string()
        } else {
            format!(
                "{} failures, {} deletes held",
                summary.failed, summary.held
            )
        };

        Self {
            metadata: OperationMetadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                timestamp: summary.started_at.to_rfc3339(),
                source_path: config.source.display().to_string(),
                replica_path: config.replica.display().to_string(),
                dry_run: config.sync.dry_run,
            },
            summary,
            errors,
            result: OperationResult { success, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirrorsync_sync::{Outcome, SyncAction};
    use mirrorsync_types::RelativePath;

    #[test]
    fn test_clean_report_is_successful() {
        let output = CycleResultJson::new(&CycleReport::new(), &Config::default());

        assert!(output.result.success);
        assert!(output.errors.is_empty());
        assert_eq!(output.metadata.source_path, "source_folder");

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["summary"]["created"], 0);
        assert_eq!(json["result"]["success"], true);
    }

    #[test]
    fn test_failures_are_listed() {
        let mut report = CycleReport::new();
        report.record(
            RelativePath::new("a.txt").unwrap(),
            SyncAction::Create,
            Outcome::Failed(Error::copy("/replica/a.txt", "disk full")),
        );

        let output = CycleResultJson::new(&report, &Config::default());

        assert!(!output.result.success);
        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.errors[0].kind, "Copy");
        assert_eq!(output.errors[0].path.as_deref(), Some("/replica/a.txt"));
    }
}
