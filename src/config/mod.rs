//! Settings resolution for the host application.
//!
//! Values come from environment-style key/value sources. Keys carry the
//! `TT_` prefix and separate group and field with `__`, e.g.
//! `TT_WATCHER__LOG_LEVEL`. Sources are layered in the order they are added;
//! a key set by a later source replaces the value from an earlier one.

mod duration;
mod error;
mod request;
mod watcher;

pub use error::ConfigError;
pub use request::{DEFAULT_REQUEST_TIMEOUT_SECS, RequestSettings};
pub use watcher::{DEFAULT_LOG_FILE_PATH, DEFAULT_LOG_LEVEL, WatcherSettings};

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Prefix every settings key must start with.
pub const ENV_PREFIX: &str = "TT_";
/// Separator between group and field in a settings key.
pub const NESTED_DELIMITER: &str = "__";

const GEN_REQ: &str = "gen_req";
const WATCHER: &str = "watcher";
const REQUEST_TIMEOUT: &str = "request_timeout";
const LOG_LEVEL: &str = "log_level";
const LOG_FILE_PATH: &str = "log_file_path";

const KNOWN_KEYS: [(&str, &str); 3] = [
    (GEN_REQ, REQUEST_TIMEOUT),
    (WATCHER, LOG_LEVEL),
    (WATCHER, LOG_FILE_PATH),
];

/// Root settings, built once at startup and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppSettings {
    request: RequestSettings,
    watcher: WatcherSettings,
}

impl AppSettings {
    pub fn new(request: RequestSettings, watcher: WatcherSettings) -> Self {
        Self { request, watcher }
    }

    /// Resolves settings from a base env file, an override env file, and the
    /// process environment, in increasing order of precedence.
    ///
    /// Either file may be missing.
    pub fn load(base: impl AsRef<Path>, override_file: impl AsRef<Path>) -> Result<Self, ConfigError> {
        SettingsLoader::new()
            .with_optional_env_file(base)?
            .with_optional_env_file(override_file)?
            .with_process_env()?
            .build()
    }

    pub fn request(&self) -> &RequestSettings {
        &self.request
    }

    pub fn watcher(&self) -> &WatcherSettings {
        &self.watcher
    }
}

/// Collects layered key/value sources and resolves them into [`AppSettings`].
#[derive(Debug, Clone, Default)]
pub struct SettingsLoader {
    values: BTreeMap<(String, String), String>,
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies key/value pairs on top of what has been loaded so far.
    /// Keys without the prefix or without a group are skipped.
    pub fn with_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in pairs {
            if let Some(slot) = split_key(key.as_ref()) {
                self.values.insert(slot, value.into());
            }
        }
        self
    }

    /// Applies a dotenv-style file. The file must exist.
    pub fn with_env_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let iter = dotenvy::from_path_iter(path).map_err(|source| read_error(path, source))?;
        self.apply_env_iter(path, iter)
    }

    /// Like [`with_env_file`](Self::with_env_file), but a missing file is skipped.
    pub fn with_optional_env_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match dotenvy::from_path_iter(path) {
            Ok(iter) => self.apply_env_iter(path, iter),
            Err(err) if err.not_found() => {
                debug!(path = %path.display(), "env file not found, skipping");
                Ok(self)
            }
            Err(source) => Err(read_error(path, source)),
        }
    }

    /// Applies the current process environment.
    ///
    /// Variables whose name is not valid UTF-8 cannot carry the prefix and are
    /// skipped. A non UTF-8 value under a known key is an error.
    pub fn with_process_env(mut self) -> Result<Self, ConfigError> {
        for (key, value) in env::vars_os() {
            let Some(key) = key.to_str() else {
                continue;
            };
            let Some(slot) = split_key(key) else {
                continue;
            };
            match value.into_string() {
                Ok(value) => {
                    self.values.insert(slot, value);
                }
                Err(_) if is_known(&slot) => {
                    return Err(ConfigError::invalid(
                        env_key(&slot.0, &slot.1),
                        "value is not valid UTF-8",
                    ));
                }
                Err(_) => debug!(key, "skipping non UTF-8 value of unknown settings key"),
            }
        }
        Ok(self)
    }

    /// Raw value for `group`/`field` after layering, if any source set it.
    pub fn get(&self, group: &str, field: &str) -> Option<&str> {
        self.values
            .get(&(group.to_ascii_lowercase(), field.to_ascii_lowercase()))
            .map(String::as_str)
    }

    /// Validates the layered values and applies defaults for missing keys.
    pub fn build(&self) -> Result<AppSettings, ConfigError> {
        for slot in self.values.keys() {
            if !is_known(slot) {
                debug!(key = %env_key(&slot.0, &slot.1), "ignoring unknown settings key");
            }
        }

        let request = match self.get(GEN_REQ, REQUEST_TIMEOUT) {
            Some(raw) => {
                let timeout = duration::parse_timeout(raw)
                    .map_err(|message| ConfigError::invalid(env_key(GEN_REQ, REQUEST_TIMEOUT), message))?;
                RequestSettings::from_duration(timeout)
            }
            None => RequestSettings::default(),
        };

        let log_level = self.get(WATCHER, LOG_LEVEL).unwrap_or(DEFAULT_LOG_LEVEL);
        let log_file_path = self
            .get(WATCHER, LOG_FILE_PATH)
            .map(|raw| PathBuf::from(raw.trim()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE_PATH));
        let watcher = WatcherSettings::new(log_level, log_file_path).map_err(rename_key)?;

        Ok(AppSettings::new(request, watcher))
    }

    fn apply_env_iter<R: std::io::Read>(
        mut self,
        path: &Path,
        iter: dotenvy::Iter<R>,
    ) -> Result<Self, ConfigError> {
        for item in iter {
            let (key, value) = item.map_err(|source| read_error(path, source))?;
            self = self.with_pairs([(key, value)]);
        }
        Ok(self)
    }
}

/// Splits `TT_GROUP__FIELD` into lower-case `(group, field)`.
fn split_key(key: &str) -> Option<(String, String)> {
    let upper = key.trim().to_ascii_uppercase();
    let rest = upper.strip_prefix(ENV_PREFIX)?;
    let (group, field) = rest.split_once(NESTED_DELIMITER)?;
    if group.is_empty() || field.is_empty() {
        return None;
    }
    Some((group.to_ascii_lowercase(), field.to_ascii_lowercase()))
}

fn is_known((group, field): &(String, String)) -> bool {
    KNOWN_KEYS.contains(&(group.as_str(), field.as_str()))
}

fn env_key(group: &str, field: &str) -> String {
    format!(
        "{ENV_PREFIX}{}{NESTED_DELIMITER}{}",
        group.to_ascii_uppercase(),
        field.to_ascii_uppercase()
    )
}

/// Rewrites a `group.field` key in an error into the env key the user set.
fn rename_key(err: ConfigError) -> ConfigError {
    match err {
        ConfigError::InvalidValue { key, message } => {
            let key = match key.split_once('.') {
                Some((group, field)) => env_key(group, field),
                None => key,
            };
            ConfigError::InvalidValue { key, message }
        }
        other => other,
    }
}

fn read_error(path: &Path, source: dotenvy::Error) -> ConfigError {
    ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    }
}
