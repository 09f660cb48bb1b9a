//! Configuration management for mirrorsync
//!
//! Settings come from built-in defaults, an optional YAML/TOML/JSON file and
//! `MIRRORSYNC__`-prefixed environment variables, in that order. The binary
//! applies command-line overrides on top and re-validates.
//!
//! # Examples
//!
//! ```rust
//! use mirrorsync_config::ConfigBuilder;
//!
//! let config = ConfigBuilder::new()
//!     .add_defaults()
//!     .add_source_file("mirrorsync.yaml")
//!     .add_env_prefix("MIRRORSYNC")
//!     .build()
//!     .expect("Failed to load configuration");
//!
//! println!("Sync every {} seconds", config.interval_secs);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod builder;
pub mod error;
pub mod loader;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure for mirrorsync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory mirrored from
    pub source: PathBuf,
    /// Directory mirrored into
    pub replica: PathBuf,
    /// Log file path; the `.log` extension is applied on use
    pub log_file: PathBuf,
    /// Seconds to wait after a cycle completes before starting the next
    pub interval_secs: u64,
    /// Synchronization behaviour
    pub sync: SyncSettings,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: PathBuf::from("source_folder"),
            replica: PathBuf::from("replica_folder"),
            log_file: PathBuf::from("log_file"),
            interval_secs: 10,
            sync: SyncSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Pause between cycles
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Log file path with its `.log` extension
    pub fn log_path(&self) -> PathBuf {
        self.log_file.with_extension("log")
    }

    /// Check the configuration for values the scheduler cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.interval_secs == 0 {
            return Err(ConfigError::validation(
                "Interval must be a positive number of seconds",
            ));
        }

        if self.source.as_os_str().is_empty() || self.replica.as_os_str().is_empty() {
            return Err(ConfigError::validation(
                "Source and replica paths must not be empty",
            ));
        }

        if self.source == self.replica {
            return Err(ConfigError::validation(
                "Source and replica must be different directories",
            ));
        }

        if nested(&self.source, &self.replica) || nested(&self.replica, &self.source) {
            return Err(ConfigError::validation(format!(
                "Source '{}' and replica '{}' must not contain each other",
                self.source.display(),
                self.replica.display()
            )));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::validation(
                "Log level must be one of: trace, debug, info, warn, error",
            ));
        }

        Ok(())
    }
}

// Lexical check; symlinked roots are not resolved.
fn nested(inner: &Path, outer: &Path) -> bool {
    inner != outer && inner.starts_with(outer)
}

/// Synchronization behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Copy the source modification time onto replica files
    pub preserve_timestamps: bool,
    /// Index files reached through symbolic links
    pub follow_symlinks: bool,
    /// Report operations without touching the replica
    pub dry_run: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            preserve_timestamps: true,
            follow_symlinks: false,
            dry_run: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Enable JSON formatting
    pub json_format: bool,
    /// Mirror log output to the console
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            console: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.interval(), Duration::from_secs(10));
        assert!(config.sync.preserve_timestamps);
        assert!(!config.sync.dry_run);
    }

    #[rstest]
    #[case("log_file", "log_file.log")]
    #[case("logs/sync.txt", "logs/sync.log")]
    #[case("logs/sync.log", "logs/sync.log")]
    fn test_log_path_extension(#[case] configured: &str, #[case] expected: &str) {
        let config = Config {
            log_file: PathBuf::from(configured),
            ..Config::default()
        };
        assert_eq!(config.log_path(), PathBuf::from(expected));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = Config {
            interval_secs: 0,
            ..Config::default()
        };
        let error = config.validate().unwrap_err();
        assert!(error.to_string().contains("Interval"));
    }

    #[rstest]
    #[case("data", "data")]
    #[case("data", "data/replica")]
    #[case("backup/source", "backup")]
    fn test_overlapping_roots_rejected(#[case] source: &str, #[case] replica: &str) {
        let config = Config {
            source: PathBuf::from(source),
            replica: PathBuf::from(replica),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sibling_prefix_is_not_nested() {
        let config = Config {
            source: PathBuf::from("data"),
            replica: PathBuf::from("data-replica"),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }
}
