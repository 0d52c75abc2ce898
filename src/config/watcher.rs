//! Logging ("watcher") settings.

use std::path::{Path, PathBuf};

use super::error::ConfigError;
use crate::logging;

pub const DEFAULT_LOG_LEVEL: &str = "INFO";
pub const DEFAULT_LOG_FILE_PATH: &str = "files/app.log";

/// Minimum log level and log file location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherSettings {
    log_level: String,
    log_file_path: PathBuf,
}

impl WatcherSettings {
    /// Validates `log_level` against the registered levels and stores its
    /// canonical (upper-case) name.
    pub fn new(log_level: &str, log_file_path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let level = logging::lookup(log_level).ok_or_else(|| {
            ConfigError::invalid(
                "watcher.log_level",
                format!("unknown log level {:?}", log_level),
            )
        })?;

        let log_file_path = log_file_path.into();
        if log_file_path.as_os_str().is_empty() {
            return Err(ConfigError::invalid(
                "watcher.log_file_path",
                "must not be empty",
            ));
        }

        Ok(Self {
            log_level: level.name,
            log_file_path,
        })
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn log_file_path(&self) -> &Path {
        &self.log_file_path
    }
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_file_path: PathBuf::from(DEFAULT_LOG_FILE_PATH),
        }
    }
}
