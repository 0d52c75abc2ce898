//! Generic building blocks for a host application: layered settings,
//! process-wide logging with an extra `EXTDEBUG` level, and a single-shot
//! HTTP GET helper that classifies and logs its failures.

pub mod config;
pub mod error;
pub mod http;
pub mod logging;

pub use config::{AppSettings, ConfigError, RequestSettings, SettingsLoader, WatcherSettings};
pub use error::Error;
pub use http::{HttpRequester, HttpResponse, RequestError, RequestOutcome};
pub use logging::{LogInitError, LogSinkManager, Severity};
