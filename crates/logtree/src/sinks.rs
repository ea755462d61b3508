//! Bundled sink implementations
//!
//! Two basic sinks built strictly against the public [`Sink`] capability:
//! a stderr console sink and an append-mode file sink whose [`Sink::reset`]
//! reopens the file so external rotation schemes keep working.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::level::Level;
use crate::record::Record;
use crate::sink::{DefaultFormatter, Formatter, Sink};

/// Sink that writes formatted records to stderr.
pub struct ConsoleSink {
    formatter: Box<dyn Formatter>,
    level: Option<Level>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            formatter: Box::new(DefaultFormatter),
            level: None,
        }
    }

    /// Replace the formatter.
    pub fn with_formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    /// Set the sink-level severity filter.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ConsoleSink {
    fn handle(&self, record: &Record) -> io::Result<()> {
        let mut stderr = io::stderr().lock();
        writeln!(stderr, "{}", self.formatter.format(record))
    }

    fn level(&self) -> Option<Level> {
        self.level
    }
}

/// Sink that appends formatted records to a file.
///
/// The file handle lives behind a mutex; `reset` reopens the path and swaps
/// the handle in place, which is what a logrotate-style setup needs after
/// the old file has been moved away.
pub struct FileSink {
    path: PathBuf,
    formatter: Box<dyn Formatter>,
    level: Option<Level>,
    writer: Mutex<BufWriter<File>>,
}

impl FileSink {
    /// Open `path` in append mode, creating it if needed.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let writer = Mutex::new(BufWriter::new(open_append(&path)?));
        Ok(Self {
            path,
            formatter: Box::new(DefaultFormatter),
            level: None,
            writer,
        })
    }

    /// Replace the formatter.
    pub fn with_formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    /// Set the sink-level severity filter.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Path this sink appends to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl Sink for FileSink {
    fn handle(&self, record: &Record) -> io::Result<()> {
        let mut writer = self.writer.lock();
        writeln!(writer, "{}", self.formatter.format(record))?;
        writer.flush()
    }

    fn level(&self) -> Option<Level> {
        self.level
    }

    fn reset(&self) -> io::Result<()> {
        let mut writer = self.writer.lock();
        let _ = writer.flush();
        *writer = BufWriter::new(open_append(&self.path)?);
        Ok(())
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        let _ = self.writer.lock().flush();
    }
}
