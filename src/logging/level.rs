//! Severity levels and the process-wide level table.

use std::fmt;
use std::str::FromStr;
use std::sync::{OnceLock, PoisonError, RwLock};

use colored::Color;

use super::error::LogInitError;

/// Display attributes applied to a level name on colorized sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LevelStyle {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
}

impl LevelStyle {
    pub const fn plain() -> Self {
        Self {
            fg: None,
            bg: None,
            bold: false,
        }
    }

    pub const fn bold() -> Self {
        Self {
            fg: None,
            bg: None,
            bold: true,
        }
    }

    pub const fn fg(self, color: Color) -> Self {
        Self {
            fg: Some(color),
            ..self
        }
    }

    pub const fn bg(self, color: Color) -> Self {
        Self {
            bg: Some(color),
            ..self
        }
    }
}

/// A named level with its numeric rank. Higher ranks are more severe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSpec {
    pub name: String,
    pub rank: u8,
    pub style: LevelStyle,
}

/// Built-in severities.
///
/// `ExtDebug` sits one rank below `Debug` and is used for extended
/// diagnostics that are noisier than regular debug output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Trace,
    ExtDebug,
    Debug,
    Info,
    Success,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 8] = [
        Severity::Trace,
        Severity::ExtDebug,
        Severity::Debug,
        Severity::Info,
        Severity::Success,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::ExtDebug => "EXTDEBUG",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Success => "SUCCESS",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }

    pub const fn rank(self) -> u8 {
        match self {
            Severity::Trace => 5,
            Severity::ExtDebug => 9,
            Severity::Debug => 10,
            Severity::Info => 20,
            Severity::Success => 25,
            Severity::Warning => 30,
            Severity::Error => 40,
            Severity::Critical => 50,
        }
    }

    pub const fn style(self) -> LevelStyle {
        match self {
            Severity::Trace => LevelStyle::bold().fg(Color::Cyan),
            Severity::ExtDebug => LevelStyle::bold().fg(Color::Yellow),
            Severity::Debug => LevelStyle::bold().fg(Color::Blue),
            Severity::Info => LevelStyle::bold(),
            Severity::Success => LevelStyle::bold().fg(Color::Green),
            Severity::Warning => LevelStyle::bold().fg(Color::Yellow),
            Severity::Error => LevelStyle::bold().fg(Color::Red),
            Severity::Critical => LevelStyle::bold().bg(Color::Red),
        }
    }

    pub fn spec(self) -> LevelSpec {
        LevelSpec {
            name: self.name().to_string(),
            rank: self.rank(),
            style: self.style(),
        }
    }

    /// The `tracing` level an event of this severity is emitted at.
    pub const fn tracing_level(self) -> tracing::Level {
        match self {
            Severity::Trace => tracing::Level::TRACE,
            Severity::ExtDebug | Severity::Debug => tracing::Level::DEBUG,
            Severity::Info | Severity::Success => tracing::Level::INFO,
            Severity::Warning => tracing::Level::WARN,
            Severity::Error | Severity::Critical => tracing::Level::ERROR,
        }
    }

    /// Maps a plain `tracing` level onto the built-in severity of equal meaning.
    pub fn from_tracing(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Severity::Trace,
            tracing::Level::DEBUG => Severity::Debug,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::WARN => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Severity {
    type Err = LogInitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        if upper == "WARN" {
            return Ok(Severity::Warning);
        }
        Severity::ALL
            .into_iter()
            .find(|severity| severity.name() == upper)
            .ok_or_else(|| LogInitError::UnknownLevel(s.to_string()))
    }
}

fn table() -> &'static RwLock<Vec<LevelSpec>> {
    static TABLE: OnceLock<RwLock<Vec<LevelSpec>>> = OnceLock::new();
    TABLE.get_or_init(|| RwLock::new(Severity::ALL.into_iter().map(Severity::spec).collect()))
}

fn normalize(name: &str) -> String {
    let upper = name.trim().to_uppercase();
    if upper == "WARN" {
        Severity::Warning.name().to_string()
    } else {
        upper
    }
}

/// Registers a level in the process-wide table.
///
/// Registering a name that already exists with the same rank returns the
/// existing entry unchanged. A different rank for an existing name is
/// rejected.
pub fn register_level(name: &str, rank: u8, style: LevelStyle) -> Result<LevelSpec, LogInitError> {
    let name = normalize(name);
    if name.is_empty() {
        return Err(LogInitError::UnknownLevel(name));
    }

    let mut levels = table().write().unwrap_or_else(PoisonError::into_inner);
    if let Some(existing) = levels.iter().find(|spec| spec.name == name) {
        if existing.rank != rank {
            return Err(LogInitError::LevelConflict {
                name,
                existing: existing.rank,
                requested: rank,
            });
        }
        return Ok(existing.clone());
    }

    let spec = LevelSpec { name, rank, style };
    levels.push(spec.clone());
    Ok(spec)
}

/// Looks up a level by name, case-insensitively. `WARN` is accepted for `WARNING`.
pub fn lookup(name: &str) -> Option<LevelSpec> {
    let name = normalize(name);
    table()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .find(|spec| spec.name == name)
        .cloned()
}

/// Resolves a configured level name to its entry or fails with `UnknownLevel`.
pub fn resolve(name: &str) -> Result<LevelSpec, LogInitError> {
    lookup(name).ok_or_else(|| LogInitError::UnknownLevel(name.to_string()))
}

/// Returns the built-in severity whose `tracing` level best carries `rank`.
pub(crate) fn carrier_for_rank(rank: u8) -> Severity {
    Severity::ALL
        .into_iter()
        .rev()
        .find(|severity| severity.rank() <= rank)
        .unwrap_or(Severity::Trace)
}
