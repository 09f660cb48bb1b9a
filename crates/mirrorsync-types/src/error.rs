//! Error types and handling for mirrorsync
//!
//! Errors fall into two groups. Path-scoped errors (`Scan`, `Copy`,
//! `Delete`) describe a failure on one file; they are recorded in a cycle
//! report and never stop the remaining work. Everything else is a
//! process-level error that the binary surfaces to the user.

use std::fmt::Display;
use std::path::{Path, PathBuf};

/// Main error type for mirrorsync operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    /// A path could not be enumerated or hashed while indexing a tree
    #[error("Failed to scan '{}': {message}", path.display())]
    Scan {
        /// Path that could not be scanned
        path: PathBuf,
        /// Underlying failure
        message: String,
    },

    /// Creating or updating a replica file failed
    #[error("Failed to copy '{}': {message}", path.display())]
    Copy {
        /// Replica path that could not be written
        path: PathBuf,
        /// Underlying failure
        message: String,
    },

    /// Removing a replica file failed
    #[error("Failed to delete '{}': {message}", path.display())]
    Delete {
        /// Replica path that could not be removed
        path: PathBuf,
        /// Underlying failure
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },

    /// Generic error with custom message
    #[error("{message}")]
    Other {
        /// Custom error message
        message: String,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Indexing errors
    Scan,
    /// Create/update errors
    Copy,
    /// Removal errors
    Delete,
    /// Configuration errors
    Config,
    /// Other errors
    Other,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Scan { .. } => ErrorKind::Scan,
            Self::Copy { .. } => ErrorKind::Copy,
            Self::Delete { .. } => ErrorKind::Delete,
            Self::Config { .. } => ErrorKind::Config,
            Self::Other { .. } => ErrorKind::Other,
        }
    }

    /// Whether the error affects exactly one file
    pub fn is_path_scoped(&self) -> bool {
        matches!(
            self,
            Self::Scan { .. } | Self::Copy { .. } | Self::Delete { .. }
        )
    }

    /// The file the error is about, for path-scoped errors
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Scan { path, .. } | Self::Copy { path, .. } | Self::Delete { path, .. } => {
                Some(path)
            }
            _ => None,
        }
    }

    /// Create a new scan error
    pub fn scan(path: impl Into<PathBuf>, cause: impl Display) -> Self {
        Self::Scan {
            path: path.into(),
            message: cause.to_string(),
        }
    }

    /// Create a new copy error
    pub fn copy(path: impl Into<PathBuf>, cause: impl Display) -> Self {
        Self::Copy {
            path: path.into(),
            message: cause.to_string(),
        }
    }

    /// Create a new delete error
    pub fn delete(path: impl Into<PathBuf>, cause: impl Display) -> Self {
        Self::Delete {
            path: path.into(),
            message: cause.to_string(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}
