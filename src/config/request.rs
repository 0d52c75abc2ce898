//! Request settings.

use std::time::Duration;

use super::duration;
use super::error::ConfigError;

/// Timeout applied when `TT_GEN_REQ__REQUEST_TIMEOUT` is not set.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Settings for outgoing HTTP requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSettings {
    timeout: Duration,
}

impl RequestSettings {
    /// Builds settings with a timeout of `timeout_secs` seconds, which must be positive.
    pub fn new(timeout_secs: i64) -> Result<Self, ConfigError> {
        let timeout = duration::seconds(timeout_secs)
            .map_err(|message| ConfigError::invalid("gen_req.request_timeout", message))?;
        Ok(Self { timeout })
    }

    /// `timeout` must come from `duration::parse_timeout`, which rejects zero.
    pub(crate) fn from_duration(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Time until a request is cancelled.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}
