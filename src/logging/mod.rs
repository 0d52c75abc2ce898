//! Process-wide logging: a level table with the `EXTDEBUG` level, per-sink
//! filtering, and a console plus size-rotated file sink pair.
//!
//! Events are produced with `tracing` and reach the sinks through
//! [`SinkLayer`]. Use [`log`] for any [`Severity`], including `EXTDEBUG`,
//! or the regular `tracing` macros for the standard levels.

mod error;
mod level;
mod rotating;
mod sink;

pub use error::LogInitError;
pub use level::{LevelSpec, LevelStyle, Severity, lookup, register_level, resolve};
pub use rotating::{ROTATION_BYTES, RotatingFile};
pub use sink::{CaptureBuffer, Record, Sink, SinkId, SinkLayer};

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::subscriber::NoSubscriber;
use tracing::{Level, debug};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::WatcherSettings;

#[derive(Default)]
struct Inner {
    sinks: RwLock<Vec<(SinkId, Arc<Sink>)>>,
    next_id: AtomicU64,
}

/// Owns the set of attached sinks.
///
/// Cloning is cheap and every clone shares the same sinks.
#[derive(Clone, Default)]
pub struct LogSinkManager {
    inner: Arc<Inner>,
}

impl LogSinkManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all attached sinks with a rotating file sink at `file_path`
    /// and a colorized console sink, both filtered at `level`.
    ///
    /// Both sinks are built before anything is detached, so a failure leaves
    /// the previous configuration in place.
    pub fn init(&self, level: &str, file_path: &Path) -> Result<(), LogInitError> {
        let min_level = level::resolve(level)?;
        let file = Sink::file(file_path, &min_level)?;
        let console = Sink::console(&min_level);

        let replacement = vec![(self.next_id(), Arc::new(file)), (self.next_id(), Arc::new(console))];
        *self.write_sinks() = replacement;

        debug!(level = %min_level.name, path = %file_path.display(), "logging initialized");
        Ok(())
    }

    /// Attaches an additional sink.
    pub fn add_sink(&self, sink: Sink) -> SinkId {
        let id = self.next_id();
        self.write_sinks().push((id, Arc::new(sink)));
        id
    }

    /// Detaches a sink. Returns `false` if it was not attached.
    pub fn remove_sink(&self, id: SinkId) -> bool {
        let mut sinks = self.write_sinks();
        let before = sinks.len();
        sinks.retain(|(sink_id, _)| *sink_id != id);
        sinks.len() != before
    }

    pub fn remove_all(&self) {
        self.write_sinks().clear();
    }

    pub fn sink_count(&self) -> usize {
        self.read_sinks().len()
    }

    /// Labels of the attached sinks, in attachment order.
    pub fn sink_labels(&self) -> Vec<String> {
        self.read_sinks()
            .iter()
            .map(|(_, sink)| sink.label().to_string())
            .collect()
    }

    /// Layer to install on a `tracing-subscriber` registry.
    pub fn layer(&self) -> SinkLayer {
        SinkLayer::new(self.clone())
    }

    pub(crate) fn dispatch(&self, record: &Record<'_>) {
        let sinks: Vec<Arc<Sink>> = self
            .read_sinks()
            .iter()
            .map(|(_, sink)| Arc::clone(sink))
            .collect();
        for sink in sinks {
            sink.emit(record);
        }
    }

    fn next_id(&self) -> SinkId {
        SinkId(self.inner.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn read_sinks(&self) -> std::sync::RwLockReadGuard<'_, Vec<(SinkId, Arc<Sink>)>> {
        self.inner.sinks.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_sinks(&self) -> std::sync::RwLockWriteGuard<'_, Vec<(SinkId, Arc<Sink>)>> {
        self.inner.sinks.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for LogSinkManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSinkManager")
            .field("sinks", &self.sink_labels())
            .finish()
    }
}

static GLOBAL: OnceLock<LogSinkManager> = OnceLock::new();
static INSTALLED: OnceLock<bool> = OnceLock::new();

/// The process-wide manager. Its layer is installed by [`init`].
pub fn global() -> &'static LogSinkManager {
    GLOBAL.get_or_init(LogSinkManager::new)
}

/// Installs the global manager as the `tracing` subscriber (once per process)
/// and attaches the console and file sinks described by `settings`.
///
/// Calling it again swaps the sinks for a fresh pair.
pub fn init(settings: &WatcherSettings) -> Result<(), LogInitError> {
    let installed = *INSTALLED.get_or_init(|| {
        tracing_subscriber::registry()
            .with(global().layer())
            .try_init()
            .is_ok()
    });
    if !installed {
        return Err(LogInitError::SubscriberInstalled);
    }

    global().init(settings.log_level(), settings.log_file_path())
}

/// Whether [`init`] has installed the global subscriber.
pub fn is_initialized() -> bool {
    INSTALLED.get().copied().unwrap_or(false)
}

/// Whether any `tracing` subscriber, global or scoped, is receiving events here.
pub fn is_wired() -> bool {
    !tracing::dispatcher::get_default(|dispatch| dispatch.is::<NoSubscriber>())
}

/// Emits `message` at `severity`.
pub fn log(severity: Severity, message: impl fmt::Display) {
    emit(severity.name(), severity, &message);
}

/// Emits `message` at a registered level, looked up by name.
pub fn log_at(name: &str, message: impl fmt::Display) -> Result<(), LogInitError> {
    let spec = level::resolve(name)?;
    emit(&spec.name, level::carrier_for_rank(spec.rank), &message);
    Ok(())
}

/// `carrier` only picks the `tracing` level; sinks filter on the named level.
fn emit(name: &str, carrier: Severity, message: &dyn fmt::Display) {
    match carrier.tracing_level() {
        Level::TRACE => tracing::event!(Level::TRACE, severity = name, "{}", message),
        Level::DEBUG => tracing::event!(Level::DEBUG, severity = name, "{}", message),
        Level::INFO => tracing::event!(Level::INFO, severity = name, "{}", message),
        Level::WARN => tracing::event!(Level::WARN, severity = name, "{}", message),
        _ => tracing::event!(Level::ERROR, severity = name, "{}", message),
    }
}

#[cfg(test)]
mod tests;
