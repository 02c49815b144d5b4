//! Output destinations for encoded records.
//!
//! A [`Sink`] receives complete, newline-terminated records and serializes
//! concurrent writers behind a lock, so records from different threads never
//! interleave mid-line. Relative ordering across threads is whatever order the
//! lock is acquired in.

use parking_lot::Mutex;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

/// Path that resolves to the process's standard output.
pub const STDOUT: &str = "stdout";
/// Path that resolves to the process's standard error.
pub const STDERR: &str = "stderr";

/// Destination for encoded records.
pub trait Sink: Send + Sync {
    /// Writes one complete record.
    fn write_record(&self, record: &[u8]) -> io::Result<()>;

    /// Flushes buffered records to the underlying destination.
    fn sync(&self) -> io::Result<()>;
}

/// Opens the sink named by `path`.
///
/// `stdout` and `stderr` resolve to the standard streams; anything else is a
/// file path, created if missing and opened for appending.
pub fn open(path: &str) -> io::Result<Arc<dyn Sink>> {
    match path {
        STDOUT => Ok(Arc::new(WriterSink::new(io::stdout()))),
        STDERR => Ok(Arc::new(WriterSink::new(io::stderr()))),
        path => Ok(Arc::new(FileSink::open(path)?)),
    }
}

/// Sink over any `Write` implementation.
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W> WriterSink<W>
where
    W: Write + Send,
{
    /// Wraps a writer.
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl<W> Sink for WriterSink<W>
where
    W: Write + Send,
{
    fn write_record(&self, record: &[u8]) -> io::Result<()> {
        self.writer.lock().write_all(record)
    }

    fn sync(&self) -> io::Result<()> {
        self.writer.lock().flush()
    }
}

impl<W> fmt::Debug for WriterSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterSink").finish_non_exhaustive()
    }
}

/// Sink appending to a file. `sync` flushes to the storage device.
#[derive(Debug)]
pub struct FileSink {
    file: Mutex<File>,
}

impl FileSink {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl Sink for FileSink {
    fn write_record(&self, record: &[u8]) -> io::Result<()> {
        self.file.lock().write_all(record)
    }

    fn sync(&self) -> io::Result<()> {
        let mut file = self.file.lock();
        file.flush()?;
        file.sync_all()
    }
}

/// In-memory sink for tests and embedding. Clones share one buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }

    /// Written records, one per line.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// Written records parsed as JSON. Lines that are not JSON are skipped.
    pub fn records(&self) -> Vec<serde_json::Value> {
        self.contents()
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    /// Discards everything written so far.
    pub fn clear(&self) {
        self.buf.lock().clear();
    }
}

impl Sink for MemorySink {
    fn write_record(&self, record: &[u8]) -> io::Result<()> {
        self.buf.lock().extend_from_slice(record);
        Ok(())
    }

    fn sync(&self) -> io::Result<()> {
        Ok(())
    }
}
