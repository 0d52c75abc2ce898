//! Logging initialization error types.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to set up logging. Always fatal at startup.
#[derive(Debug, Error)]
pub enum LogInitError {
    #[error("unknown log level: {0}")]
    UnknownLevel(String),
    #[error("log level {name} is already registered with rank {existing}, refusing rank {requested}")]
    LevelConflict {
        name: String,
        existing: u8,
        requested: u8,
    },
    #[error("log file {path} is not writable: {source}")]
    FileNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("a different global tracing subscriber is already installed")]
    SubscriberInstalled,
}
