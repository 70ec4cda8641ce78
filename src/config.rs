use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{JotError, Result};

const APP_NAME: &str = "jotter";

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory where the note and todo collections are stored
    pub data_dir: PathBuf,

    /// How long shutdown waits for pending writes (in seconds)
    pub flush_timeout_secs: u64,

    /// Default log filter when RUST_LOG is not set
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = ProjectDirs::from("", "", APP_NAME)
            .map(|dirs| dirs.data_dir().to_path_buf())
            .or_else(|| dirs::home_dir().map(|home| home.join(format!(".{}", APP_NAME))))
            .unwrap_or_else(|| PathBuf::from(format!(".{}", APP_NAME)));

        Self {
            data_dir,
            flush_timeout_secs: 5,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Where the config file lives when `--config` is not given.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Reads the config at `path` (or the default path). A missing file
    /// yields the defaults; fields missing from the file are defaulted too.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => {
                debug!("No config location available, using defaults");
                return Ok(Self::default());
            }
        };

        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path)?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| JotError::ConfigError {
            message: format!("Invalid config file {}: {}", path.display(), e),
        })?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Writes the config as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_| JotError::DirectoryError {
                path: parent.to_path_buf(),
            })?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn flush_timeout(&self) -> Duration {
        Duration::from_secs(self.flush_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("nope.json"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_file_is_filled_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"data_dir": "/tmp/jotter-data"}"#).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/jotter-data"));
        assert_eq!(config.flush_timeout(), Duration::from_secs(5));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "data_dir = 3").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, JotError::ConfigError { .. }));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            data_dir: dir.path().join("data"),
            flush_timeout_secs: 2,
            log_filter: "debug".to_string(),
        };

        config.save(&path).unwrap();
        assert_eq!(Config::load(Some(&path)).unwrap(), config);
    }
}
