//! Test fixtures and file helpers.
//!
//! Provides temporary directories, one-call write/read helpers and
//! delegates that record the lifecycle hooks they see.

use evio_codec::Record;
use evio_core::{Reader, ReaderDelegate, Writer, WriterConfig, WriterDelegate, WriterFile};
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A temporary directory removed on drop.
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    /// Creates a new temporary directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Returns the directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns a writer base path inside the directory.
    pub fn base(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Writer configuration without fsync, for fast tests.
#[must_use]
pub fn fast_config() -> WriterConfig {
    WriterConfig::new().sync_on_close(false)
}

/// Writer configuration with a 1 KB budget, to force rollovers.
#[must_use]
pub fn small_files() -> WriterConfig {
    fast_config().max_file_size_kb(1)
}

/// Writes `records` through a fresh writer and returns the finished files.
///
/// # Panics
///
/// Panics if the writer fails to open, write or close.
pub fn write_records<R: Record>(base: &Path, records: &[R], config: WriterConfig) -> Vec<PathBuf> {
    let mut writer = Writer::new(base, config);
    writer.open().expect("Failed to open writer");
    for record in records {
        writer.try_write(record).expect("Failed to write record");
    }
    writer.close().expect("Failed to close writer");
    writer.files_written().to_vec()
}

/// Reads every record of the file at `path`.
///
/// # Panics
///
/// Panics if the file cannot be opened.
pub fn read_records<R: Record>(path: &Path) -> Vec<R> {
    let mut reader = Reader::open(path).expect("Failed to open reader");
    reader.records().collect()
}

/// Reads the footer pointer stored in the first eight bytes of a file.
///
/// # Panics
///
/// Panics if the file is shorter than eight bytes.
pub fn footer_pointer(path: &Path) -> u64 {
    let mut file = std::fs::File::open(path).expect("Failed to open file");
    let mut pointer = [0u8; 8];
    file.read_exact(&mut pointer).expect("Failed to read footer pointer");
    u64::from_le_bytes(pointer)
}

/// Cuts a file down to `len` bytes.
pub fn truncate_file(path: &Path, len: u64) {
    let file = OpenOptions::new()
        .write(true)
        .open(path)
        .expect("Failed to open file");
    file.set_len(len).expect("Failed to truncate file");
}

/// Overwrites the byte at `offset`.
pub fn overwrite_byte(path: &Path, offset: u64, value: u8) {
    let mut file = OpenOptions::new()
        .write(true)
        .open(path)
        .expect("Failed to open file");
    file.seek(SeekFrom::Start(offset)).expect("Failed to seek");
    file.write_all(&[value]).expect("Failed to write byte");
}

/// A shared, ordered log of lifecycle hook invocations.
#[derive(Debug, Clone, Default)]
pub struct HookLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl HookLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Returns a copy of all entries so far.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// A writer delegate logging `<hook>:<sequence>` for every hook.
#[derive(Debug, Clone)]
pub struct LoggingWriterDelegate {
    log: HookLog,
}

impl LoggingWriterDelegate {
    /// Creates a delegate appending to `log`.
    pub fn new(log: HookLog) -> Self {
        Self { log }
    }
}

impl WriterDelegate for LoggingWriterDelegate {
    fn file_will_open(&mut self, file: &mut WriterFile<'_>) {
        self.log.push(format!("will_open:{}", file.sequence()));
    }

    fn file_did_open(&mut self, file: &mut WriterFile<'_>) {
        self.log.push(format!("did_open:{}", file.sequence()));
    }

    fn file_will_close(&mut self, file: &mut WriterFile<'_>) {
        self.log.push(format!("will_close:{}", file.sequence()));
    }

    fn file_did_close(&mut self, file: &mut WriterFile<'_>) {
        self.log.push(format!("did_close:{}", file.sequence()));
    }
}

/// A reader delegate logging each hook name.
#[derive(Debug, Clone)]
pub struct LoggingReaderDelegate {
    log: HookLog,
}

impl LoggingReaderDelegate {
    /// Creates a delegate appending to `log`.
    pub fn new(log: HookLog) -> Self {
        Self { log }
    }
}

impl ReaderDelegate for LoggingReaderDelegate {
    fn file_will_open(&mut self, _reader: &Reader) {
        self.log.push("will_open");
    }

    fn file_did_open(&mut self, reader: &Reader) {
        self.log.push(format!("did_open:{}", reader.records_declared()));
    }

    fn file_will_close(&mut self, reader: &Reader) {
        self.log.push(format!("will_close:{}", reader.records_consumed()));
    }

    fn file_did_close(&mut self, _reader: &Reader) {
        self.log.push("did_close");
    }
}
