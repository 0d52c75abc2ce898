//! Startup error type.

/// Errors that must stop the host during startup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("logging error: {0}")]
    Logging(#[from] crate::logging::LogInitError),
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}
