//! Tests for logging module.

use super::*;
use chrono::Local;
use colored::Color;
use std::fs;
use std::io::Write;
use tempfile::TempDir;
use tracing::subscriber::DefaultGuard;

fn capture(manager: &LogSinkManager, level: &str) -> CaptureBuffer {
    let buffer = CaptureBuffer::new();
    manager.add_sink(Sink::new("capture", buffer.clone(), &resolve(level).unwrap(), false));
    buffer
}

fn scoped(manager: &LogSinkManager) -> DefaultGuard {
    tracing::subscriber::set_default(tracing_subscriber::registry().with(manager.layer()))
}

fn emit_all_levels() {
    tracing::trace!("Test TRACE message");
    tracing::debug!("Test DEBUG message");
    tracing::info!("Test INFO message");
    log(Severity::ExtDebug, "Test EXTDEBUG message");
    tracing::warn!("Test WARNING message");
}

// ==================== Level table tests ====================

#[test]
fn test_extdebug_rank_and_style() {
    let spec = lookup("EXTDEBUG").unwrap();

    assert_eq!(spec.rank, 9);
    assert_eq!(spec.style, LevelStyle::bold().fg(Color::Yellow));
    assert!(spec.rank < lookup("DEBUG").unwrap().rank);
    assert!(Severity::ExtDebug < Severity::Debug);
}

#[test]
fn test_standard_ranks() {
    let ranks: Vec<u8> = Severity::ALL.iter().map(|s| s.rank()).collect();
    assert_eq!(ranks, vec![5, 9, 10, 20, 25, 30, 40, 50]);
}

#[test]
fn test_register_existing_level_same_rank_is_noop() {
    let spec = register_level("EXTDEBUG", 9, LevelStyle::plain()).unwrap();

    assert_eq!(spec.rank, 9);
    // The original style is kept.
    assert_eq!(spec.style, Severity::ExtDebug.style());
}

#[test]
fn test_register_existing_level_conflicting_rank_fails() {
    let err = register_level("extdebug", 12, LevelStyle::plain()).unwrap_err();

    assert!(matches!(
        err,
        LogInitError::LevelConflict {
            existing: 9,
            requested: 12,
            ..
        }
    ));
    assert_eq!(lookup("EXTDEBUG").unwrap().rank, 9);
}

#[test]
fn test_register_custom_level() {
    let style = LevelStyle::bold().fg(Color::Magenta);
    let spec = register_level("notice", 22, style).unwrap();

    assert_eq!(spec.name, "NOTICE");
    assert_eq!(lookup("Notice").unwrap(), spec);
    assert_eq!(register_level("NOTICE", 22, style).unwrap(), spec);
}

#[test]
fn test_register_empty_name_fails() {
    assert!(register_level("  ", 3, LevelStyle::plain()).is_err());
}

#[test]
fn test_lookup_accepts_warn_alias() {
    assert_eq!(lookup("warn").unwrap().name, "WARNING");
    assert!(lookup("LOUD").is_none());
    assert!(matches!(resolve("LOUD"), Err(LogInitError::UnknownLevel(_))));
}

#[test]
fn test_severity_from_str() {
    assert_eq!("extdebug".parse::<Severity>().unwrap(), Severity::ExtDebug);
    assert_eq!("WARN".parse::<Severity>().unwrap(), Severity::Warning);
    assert_eq!(" critical ".parse::<Severity>().unwrap(), Severity::Critical);
    assert!("verbose".parse::<Severity>().is_err());
}

#[test]
fn test_carrier_for_rank() {
    assert_eq!(level::carrier_for_rank(0), Severity::Trace);
    assert_eq!(level::carrier_for_rank(9), Severity::ExtDebug);
    assert_eq!(level::carrier_for_rank(22), Severity::Info);
    assert_eq!(level::carrier_for_rank(99), Severity::Critical);
}

// ==================== Filtering tests ====================

#[test]
fn test_sink_threshold_at_extdebug() {
    let manager = LogSinkManager::new();
    let buffer = capture(&manager, "EXTDEBUG");
    let _guard = scoped(&manager);

    emit_all_levels();

    let output = buffer.contents();
    assert!(!output.contains("Test TRACE message"));
    assert!(output.contains("Test DEBUG message"));
    assert!(output.contains("Test INFO message"));
    assert!(output.contains("Test EXTDEBUG message"));
    assert!(output.contains("Test WARNING message"));
}

#[test]
fn test_filtering_is_per_sink() {
    let manager = LogSinkManager::new();
    let verbose = capture(&manager, "TRACE");
    let quiet = capture(&manager, "WARNING");
    let _guard = scoped(&manager);

    emit_all_levels();

    assert_eq!(verbose.lines().len(), 5);
    assert_eq!(quiet.lines().len(), 1);
    assert!(quiet.contents().contains("Test WARNING message"));
}

#[test]
fn test_debug_threshold_drops_extdebug() {
    let manager = LogSinkManager::new();
    let buffer = capture(&manager, "DEBUG");
    let _guard = scoped(&manager);

    log(Severity::ExtDebug, "extended detail");
    log(Severity::Debug, "regular detail");

    let output = buffer.contents();
    assert!(!output.contains("extended detail"));
    assert!(output.contains("regular detail"));
}

#[test]
fn test_log_at_custom_level() {
    register_level("AUDIT", 35, LevelStyle::bold().fg(Color::Blue)).unwrap();
    let manager = LogSinkManager::new();
    let above = capture(&manager, "WARNING");
    let below = capture(&manager, "ERROR");
    let _guard = scoped(&manager);

    log_at("audit", "user logged in").unwrap();

    assert!(above.contents().contains("| AUDIT    |"));
    assert!(above.contents().contains("user logged in"));
    assert!(below.contents().is_empty());
}

#[test]
fn test_log_at_unknown_level() {
    assert!(matches!(
        log_at("NOPE", "message"),
        Err(LogInitError::UnknownLevel(_))
    ));
}

#[test]
fn test_line_format_contains_level_and_fields() {
    let manager = LogSinkManager::new();
    let buffer = capture(&manager, "TRACE");
    let _guard = scoped(&manager);

    tracing::error!(url = "https://example.com", "boom");

    let line = buffer.lines().pop().unwrap();
    assert!(line.contains("| ERROR    |"), "{line}");
    assert!(line.ends_with("boom url=https://example.com"), "{line}");
}

#[test]
fn test_format_line_plain() {
    let spec = Severity::ExtDebug.spec();
    let record = Record {
        timestamp: Local::now(),
        level: &spec,
        target: "tetue",
        message: "hello",
        fields: "",
    };

    let line = sink::format_line(&record, false);
    assert!(line.ends_with(" | EXTDEBUG | tetue - hello\n"), "{line}");
}

#[test]
fn test_is_wired_inside_scope() {
    let manager = LogSinkManager::new();
    let _guard = scoped(&manager);
    assert!(is_wired());
}

#[test]
fn test_is_wired_false_without_subscriber() {
    let _guard = tracing::subscriber::set_default(NoSubscriber::default());
    assert!(!is_wired());
}

// ==================== Sink management tests ====================

#[test]
fn test_add_and_remove_sink() {
    let manager = LogSinkManager::new();
    let buffer = CaptureBuffer::new();
    let id = manager.add_sink(Sink::new("a", buffer.clone(), &Severity::Info.spec(), false));
    assert_eq!(manager.sink_count(), 1);

    assert!(manager.remove_sink(id));
    assert!(!manager.remove_sink(id));
    assert_eq!(manager.sink_count(), 0);

    let _guard = scoped(&manager);
    tracing::info!("nobody listens");
    assert!(buffer.contents().is_empty());
}

#[test]
fn test_init_attaches_file_and_console() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    let manager = LogSinkManager::new();

    manager.init("TRACE", &path).unwrap();

    assert!(path.exists(), "Log file was not created");
    assert_eq!(
        manager.sink_labels(),
        vec![path.display().to_string(), "console".to_string()]
    );
}

#[test]
fn test_init_creates_parent_dirs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("files").join("nested").join("app.log");

    LogSinkManager::new().init("INFO", &path).unwrap();

    assert!(path.exists());
}

#[test]
fn test_file_logging() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    let manager = LogSinkManager::new();
    manager.init("TRACE", &path).unwrap();
    let _guard = scoped(&manager);

    tracing::debug!("Test DEBUG message");
    tracing::info!("Test INFO message");
    log(Severity::ExtDebug, "Test EXTDEBUG message");

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("Test DEBUG message"));
    assert!(content.contains("Test INFO message"));
    assert!(content.contains("Test EXTDEBUG message"));
    // File output is never colorized.
    assert!(!content.contains('\u{1b}'));
}

#[test]
fn test_file_sink_appends_to_existing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    fs::write(&path, "Test content\n").unwrap();

    let manager = LogSinkManager::new();
    manager.init("INFO", &path).unwrap();
    let _guard = scoped(&manager);
    tracing::info!("appended");

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("Test content\n"));
    assert!(content.contains("appended"));
}

#[test]
fn test_init_twice_keeps_two_sinks() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    let manager = LogSinkManager::new();

    manager.init("INFO", &path).unwrap();
    manager.init("INFO", &path).unwrap();
    assert_eq!(manager.sink_count(), 2);

    let _guard = scoped(&manager);
    tracing::info!("only once please");

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.matches("only once please").count(), 1);
}

#[test]
fn test_init_replaces_extra_sinks() {
    let dir = TempDir::new().unwrap();
    let manager = LogSinkManager::new();
    let buffer = capture(&manager, "TRACE");

    manager.init("INFO", &dir.path().join("app.log")).unwrap();
    assert_eq!(manager.sink_count(), 2);

    let _guard = scoped(&manager);
    tracing::info!("after reset");
    assert!(buffer.contents().is_empty());
}

#[test]
fn test_init_unwritable_path_keeps_previous_sinks() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("app.log");
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "").unwrap();

    let manager = LogSinkManager::new();
    manager.init("INFO", &good).unwrap();
    let before = manager.sink_labels();

    let err = manager.init("INFO", &blocker.join("app.log")).unwrap_err();

    assert!(matches!(err, LogInitError::FileNotWritable { .. }));
    assert!(err.to_string().contains("not writable"));
    assert_eq!(manager.sink_labels(), before);
}

#[test]
fn test_init_unknown_level() {
    let dir = TempDir::new().unwrap();
    let manager = LogSinkManager::new();

    let err = manager.init("SHOUT", &dir.path().join("app.log")).unwrap_err();

    assert!(matches!(err, LogInitError::UnknownLevel(_)));
    assert_eq!(manager.sink_count(), 0);
}

// ==================== Rotation tests ====================

#[test]
fn test_rotating_file_rotates_past_threshold() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    let mut file = RotatingFile::open(&path, 64).unwrap();

    let line = "0123456789012345678901234567890123456789\n";
    file.write_all(line.as_bytes()).unwrap();
    assert_eq!(file.len(), line.len() as u64);
    file.write_all(line.as_bytes()).unwrap();
    file.flush().unwrap();

    let mut names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    assert_eq!(names.len(), 2, "{names:?}");
    assert!(names.iter().any(|n| n == "app.log"));
    assert!(names.iter().any(|n| n.starts_with("app.") && n.ends_with(".log") && n != "app.log"));
    assert_eq!(fs::read_to_string(&path).unwrap(), line);
}

#[test]
fn test_rotating_file_does_not_rotate_empty_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    let mut file = RotatingFile::open(&path, 8).unwrap();

    // A single write larger than the threshold still lands in the fresh file.
    file.write_all(b"much longer than eight bytes\n").unwrap();

    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    assert!(!file.is_empty());
}

#[test]
fn test_rotating_file_counts_existing_content() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    fs::write(&path, "0123456789").unwrap();

    let file = RotatingFile::open(&path, ROTATION_BYTES).unwrap();

    assert_eq!(file.len(), 10);
    assert_eq!(file.path(), path.as_path());
}
