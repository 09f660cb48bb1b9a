//! Configuration loader utilities

use crate::{Config, ConfigBuilder, ConfigError, ConfigResult};
use std::path::{Path, PathBuf};

/// Environment variable prefix, e.g. `MIRRORSYNC__INTERVAL_SECS=30`
pub const ENV_PREFIX: &str = "MIRRORSYNC";

/// Configuration loader with common loading patterns
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the first config file found in the working
    /// directory, then the environment
    pub fn load_default() -> ConfigResult<Config> {
        let mut builder = ConfigBuilder::new().add_defaults();

        if let Some(path) = Self::default_config_paths()
            .into_iter()
            .find(|path| path.exists())
        {
            builder = builder.add_source_file(path);
        }

        builder.add_env_prefix(ENV_PREFIX).build()
    }

    /// Load configuration from a specific file, then the environment
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Configuration file not found",
                ),
            });
        }

        ConfigBuilder::new()
            .add_defaults()
            .add_source_file(path)
            .add_env_prefix(ENV_PREFIX)
            .build()
    }

    /// Save configuration to a file, choosing the format by extension
    pub fn save_to_file<P: AsRef<Path>>(config: &Config, path: P) -> ConfigResult<()> {
        let path = path.as_ref();

        let content = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::to_string_pretty(config)?,
            Some("json") => serde_json::to_string_pretty(config)?,
            _ => serde_yaml::to_string(config)?,
        };

        std::fs::write(path, content).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Write the default configuration to a file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> ConfigResult<()> {
        Self::save_to_file(&Config::default(), path)
    }

    fn default_config_paths() -> Vec<PathBuf> {
        ["mirrorsync.yaml", "mirrorsync.yml", "mirrorsync.toml", "mirrorsync.json"]
            .into_iter()
            .map(PathBuf::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("mirrorsync.yaml")]
    #[case("mirrorsync.toml")]
    #[case("mirrorsync.json")]
    fn test_generated_config_loads_back(#[case] name: &str) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(name);

        ConfigLoader::generate_default_config(&path).unwrap();
        let loaded = ConfigLoader::load_from_file(&path).unwrap();

        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_saved_values_survive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.yaml");
        let config = Config {
            source: PathBuf::from("/srv/source"),
            replica: PathBuf::from("/srv/replica"),
            interval_secs: 60,
            ..Config::default()
        };

        ConfigLoader::save_to_file(&config, &path).unwrap();
        assert_eq!(ConfigLoader::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = ConfigLoader::load_from_file("/nonexistent/mirrorsync.yaml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
