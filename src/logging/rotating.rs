//! Append-only log file that rotates once it grows past a size threshold.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

/// Rotation threshold for the file sink.
pub const ROTATION_BYTES: u64 = 500 * 1024 * 1024;

/// A log file that is renamed aside and reopened when the next write would
/// take it past `max_bytes`.
///
/// Rotated files keep the original stem and extension with a timestamp in
/// between, e.g. `app.2024-05-01_13-45-12_000123.log`.
#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    file: File,
    written: u64,
    max_bytes: u64,
}

impl RotatingFile {
    /// Opens (or creates) the file in append mode, creating parent directories.
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = open_append(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            path,
            file,
            written,
            max_bytes: max_bytes.max(1),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes in the current (non-rotated) file.
    pub fn len(&self) -> u64 {
        self.written
    }

    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        fs::rename(&self.path, rotated_path(&self.path))?;
        self.file = open_append(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn rotated_path(path: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S_%6f").to_string();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path.extension().map(|e| e.to_string_lossy().into_owned());

    let name_with = |suffix: &str| match &ext {
        Some(ext) => format!("{stem}.{stamp}{suffix}.{ext}"),
        None => format!("{stem}.{stamp}{suffix}"),
    };

    // Two rotations inside the same microsecond must not clobber each other.
    let mut candidate = path.with_file_name(name_with(""));
    let mut n = 1;
    while candidate.exists() {
        candidate = path.with_file_name(name_with(&format!(".{n}")));
        n += 1;
    }
    candidate
}
