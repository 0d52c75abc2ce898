//! Log sinks and the `tracing` layer that feeds them.

use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Local};
use colored::{ColoredString, Colorize};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use super::LogSinkManager;
use super::error::LogInitError;
use super::level::{self, LevelSpec, LevelStyle, Severity};
use super::rotating::{ROTATION_BYTES, RotatingFile};

/// Field name carrying the level name on events emitted through `log`.
pub(crate) const SEVERITY_FIELD: &str = "severity";

/// Handle returned when a sink is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkId(pub(crate) u64);

/// One formatted log event.
pub struct Record<'a> {
    pub timestamp: DateTime<Local>,
    pub level: &'a LevelSpec,
    pub target: &'a str,
    pub message: &'a str,
    pub fields: &'a str,
}

/// A destination with its own minimum level.
pub struct Sink {
    label: String,
    min_rank: u8,
    colorize: bool,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl Sink {
    /// Creates a sink writing to `writer` that accepts events at `min_level` and above.
    pub fn new(
        label: impl Into<String>,
        writer: impl Write + Send + 'static,
        min_level: &LevelSpec,
        colorize: bool,
    ) -> Self {
        Self {
            label: label.into(),
            min_rank: min_level.rank,
            colorize,
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Colorized sink on standard error.
    pub fn console(min_level: &LevelSpec) -> Self {
        Self::new("console", io::stderr(), min_level, true)
    }

    /// Plain-text file sink rotating at [`ROTATION_BYTES`].
    pub fn file(path: &Path, min_level: &LevelSpec) -> Result<Self, LogInitError> {
        Self::rotating_file(path, min_level, ROTATION_BYTES)
    }

    pub fn rotating_file(
        path: &Path,
        min_level: &LevelSpec,
        max_bytes: u64,
    ) -> Result<Self, LogInitError> {
        let file =
            RotatingFile::open(path, max_bytes).map_err(|source| LogInitError::FileNotWritable {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(
            path.display().to_string(),
            file,
            min_level,
            false,
        ))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn min_rank(&self) -> u8 {
        self.min_rank
    }

    pub fn accepts(&self, rank: u8) -> bool {
        rank >= self.min_rank
    }

    pub(crate) fn emit(&self, record: &Record<'_>) {
        if !self.accepts(record.level.rank) {
            return;
        }
        let line = format_line(record, self.colorize);
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        // Nowhere left to report a failing sink.
        let _ = writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.flush());
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("label", &self.label)
            .field("min_rank", &self.min_rank)
            .field("colorize", &self.colorize)
            .finish_non_exhaustive()
    }
}

/// In-memory writer whose contents can be read back, e.g. to assert on log output.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer(Arc<Mutex<Vec<u8>>>);

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let buf = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Formats a record as `timestamp | LEVEL    | target - message fields`.
pub(crate) fn format_line(record: &Record<'_>, colorize: bool) -> String {
    let timestamp = record.timestamp.format("%Y-%m-%d %H:%M:%S%.3f").to_string();
    let level = format!("{:<8}", record.level.name);

    let mut line = if colorize {
        format!(
            "{} | {} | {} - {}",
            timestamp.green(),
            paint(&level, &record.level.style),
            record.target.cyan(),
            paint(record.message, &record.level.style),
        )
    } else {
        format!(
            "{timestamp} | {level} | {} - {}",
            record.target, record.message
        )
    };

    if !record.fields.is_empty() {
        line.push(' ');
        line.push_str(record.fields);
    }
    line.push('\n');
    line
}

fn paint(text: &str, style: &LevelStyle) -> ColoredString {
    let mut painted = text.normal();
    if let Some(fg) = style.fg {
        painted = painted.color(fg);
    }
    if let Some(bg) = style.bg {
        painted = painted.on_color(bg);
    }
    if style.bold {
        painted = painted.bold();
    }
    painted
}

/// `tracing-subscriber` layer that forwards every event to the manager's sinks.
#[derive(Debug, Clone)]
pub struct SinkLayer {
    manager: LogSinkManager,
}

impl SinkLayer {
    pub(crate) fn new(manager: LogSinkManager) -> Self {
        Self { manager }
    }
}

impl<S: Subscriber> Layer<S> for SinkLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        let level = visitor
            .severity
            .as_deref()
            .and_then(level::lookup)
            .unwrap_or_else(|| Severity::from_tracing(*metadata.level()).spec());

        let record = Record {
            timestamp: Local::now(),
            level: &level,
            target: metadata.target(),
            message: &visitor.message,
            fields: &visitor.fields,
        };
        self.manager.dispatch(&record);
    }
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    severity: Option<String>,
    fields: String,
}

impl EventVisitor {
    fn push_field(&mut self, name: &str, value: &str) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        self.fields.push_str(name);
        self.fields.push('=');
        self.fields.push_str(value);
    }
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            SEVERITY_FIELD => self.severity = Some(value.to_string()),
            name => self.push_field(name, value),
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{value:?}"),
            SEVERITY_FIELD => self.severity = Some(format!("{value:?}")),
            name => self.push_field(name, &format!("{value:?}")),
        }
    }
}
