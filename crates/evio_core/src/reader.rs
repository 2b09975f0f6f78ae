//! Event file reader.
//!
//! Constructing a [`Reader`] opens the file. Opening is a two-phase
//! protocol:
//!
//! 1. Read the 8-byte footer pointer `P`, skip `P` bytes of record frames
//!    and parse the metadata frame found there.
//! 2. Seek back to offset 8 so the next frame read is the first record.
//!
//! A file whose pointer or metadata cannot be parsed is unusable and the
//! constructor fails. After that, errors are sticky: the first framing
//! error clears [`Reader::good`] and every later `read`/`skip` returns
//! `false`.
//!
//! A payload that is well framed but fails to decode is reported by that
//! one `read` only. The frame still counts as consumed and the stream stays
//! good, so the following records remain readable.

use crate::config::ReaderConfig;
use crate::cursor::BackendCursor;
use crate::delegate::{dispatch_reader, LifecycleEvent, ReaderDelegate};
use crate::error::{CoreError, CoreResult};
use crate::format::FOOTER_POINTER_SIZE;
use crate::metadata::MetadataBlock;
use evio_codec::{read_frame, skip_frame, CodecError, FrameSource, Record};
use evio_storage::{FileBackend, StorageBackend};
use std::io::Read;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Sequential reader over one event file.
pub struct Reader {
    path: PathBuf,
    config: ReaderConfig,
    cursor: Option<BackendCursor>,
    metadata: MetadataBlock,
    footer_pointer: u64,
    is_good: bool,
    records_declared: u32,
    records_consumed: u32,
    delegate: Option<Box<dyn ReaderDelegate>>,
}

impl Reader {
    /// Opens the event file at `path` with the default configuration.
    ///
    /// # Errors
    ///
    /// See [`Reader::open_with`].
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        Self::open_with(path, ReaderConfig::default(), None)
    }

    /// Opens the event file at `path`.
    ///
    /// The delegate, if any, sees `file_will_open` before the file is
    /// touched and `file_did_open` once the reader is positioned at the
    /// first record.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `path` is empty or does not exist
    /// - the file is shorter than the footer pointer
    /// - the footer pointer points past the end of the file
    /// - the metadata frame is missing, malformed or cannot be decoded
    pub fn open_with(
        path: impl AsRef<Path>,
        config: ReaderConfig,
        delegate: Option<Box<dyn ReaderDelegate>>,
    ) -> CoreResult<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(CoreError::NoInputPath);
        }
        if !path.exists() {
            return Err(CoreError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let mut reader = Self::unopened(path.to_path_buf(), config, delegate);
        reader.notify(LifecycleEvent::WillOpen);

        let backend = FileBackend::open_read_only(path)?;
        reader.attach(Box::new(backend))?;

        reader.notify(LifecycleEvent::DidOpen);
        Ok(reader)
    }

    /// Opens an event file image held by an arbitrary backend.
    ///
    /// `name` is only used for diagnostics and [`Reader::filename`].
    ///
    /// # Errors
    ///
    /// Same format errors as [`Reader::open_with`].
    pub fn from_backend(
        name: impl Into<PathBuf>,
        backend: Box<dyn StorageBackend>,
        config: ReaderConfig,
        delegate: Option<Box<dyn ReaderDelegate>>,
    ) -> CoreResult<Self> {
        let mut reader = Self::unopened(name.into(), config, delegate);
        reader.notify(LifecycleEvent::WillOpen);
        reader.attach(backend)?;
        reader.notify(LifecycleEvent::DidOpen);
        Ok(reader)
    }

    fn unopened(
        path: PathBuf,
        config: ReaderConfig,
        delegate: Option<Box<dyn ReaderDelegate>>,
    ) -> Self {
        Self {
            path,
            config,
            cursor: None,
            metadata: MetadataBlock::default(),
            footer_pointer: 0,
            is_good: true,
            records_declared: 0,
            records_consumed: 0,
            delegate,
        }
    }

    /// Locates and parses the footer, then rewinds to the first record.
    fn attach(&mut self, backend: Box<dyn StorageBackend>) -> CoreResult<()> {
        let mut cursor = BackendCursor::new(backend)?;
        let size = cursor.size();

        let mut pointer = [0u8; FOOTER_POINTER_SIZE as usize];
        cursor.read_exact(&mut pointer).map_err(|_| {
            CoreError::invalid_format(format!(
                "failed to read events length: file is {size} bytes"
            ))
        })?;
        let footer_pointer = u64::from_le_bytes(pointer);

        cursor.discard(footer_pointer).map_err(|_| {
            CoreError::invalid_format(format!(
                "footer pointer {footer_pointer} points past the end of a {size} byte file"
            ))
        })?;

        let limits = self.config.frame_limits();
        let payload = read_frame(&mut cursor, &limits).map_err(|err| {
            CoreError::invalid_format(format!("failed to read metadata frame: {err}"))
        })?;

        let mut metadata = MetadataBlock::default();
        if !payload.is_empty() {
            metadata.decode(&payload).map_err(|err| {
                CoreError::invalid_format(format!("failed to decode metadata: {err}"))
            })?;
        }

        if cursor.remaining() > 0 {
            debug!(
                path = %self.path.display(),
                trailing = cursor.remaining(),
                "ignoring bytes after metadata frame"
            );
        }

        cursor.seek_to(FOOTER_POINTER_SIZE);

        debug!(
            path = %self.path.display(),
            events = metadata.events(),
            footer_pointer,
            "opened input file"
        );

        self.records_declared = metadata.events();
        self.records_consumed = 0;
        self.is_good = true;
        self.footer_pointer = footer_pointer;
        self.metadata = metadata;
        self.cursor = Some(cursor);
        Ok(())
    }

    /// Releases the input file.
    ///
    /// The metadata stays available. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.cursor.is_none() {
            return;
        }

        self.notify(LifecycleEvent::WillClose);
        self.cursor = None;
        debug!(path = %self.path.display(), consumed = self.records_consumed, "closed input file");
        self.notify(LifecycleEvent::DidClose);
    }

    /// Returns `true` while the input file is held open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.cursor.is_some()
    }

    /// Returns `false` once a framing error has been seen.
    #[must_use]
    pub fn good(&self) -> bool {
        self.is_good
    }

    /// Path (or backend name) of the input.
    #[must_use]
    pub fn filename(&self) -> &Path {
        &self.path
    }

    /// Metadata parsed from the footer.
    #[must_use]
    pub fn metadata(&self) -> &MetadataBlock {
        &self.metadata
    }

    /// Byte length of the record region, as stored in the footer pointer.
    #[must_use]
    pub fn footer_pointer(&self) -> u64 {
        self.footer_pointer
    }

    /// Number of records the footer declares.
    #[must_use]
    pub fn records_declared(&self) -> u32 {
        self.records_declared
    }

    /// Number of records read or skipped so far.
    #[must_use]
    pub fn records_consumed(&self) -> u32 {
        self.records_consumed
    }

    /// Absolute byte offset of the next frame, `None` once closed.
    #[must_use]
    pub fn position(&self) -> Option<u64> {
        self.cursor.as_ref().map(BackendCursor::position)
    }

    /// The configuration this reader was opened with.
    #[must_use]
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Attaches a delegate, replacing any previous one. `None` detaches.
    pub fn set_delegate(&mut self, delegate: Option<Box<dyn ReaderDelegate>>) {
        self.delegate = delegate;
    }

    /// The attached delegate.
    #[must_use]
    pub fn delegate(&self) -> Option<&dyn ReaderDelegate> {
        self.delegate.as_deref()
    }

    /// Reads the next record into `record`.
    ///
    /// Returns `false` at end of stream, after a framing error, or if the
    /// payload fails to decode. An empty payload resets `record` to its
    /// default value.
    pub fn read<R: Record>(&mut self, record: &mut R) -> bool {
        let limits = self.config.frame_limits();
        let Some(payload) = self.advance(|cursor| read_frame(cursor, &limits).map(|p| (p.len(), p)))
        else {
            return false;
        };

        if payload.is_empty() {
            *record = R::default();
            return true;
        }

        if let Err(err) = record.decode(&payload) {
            warn!(
                path = %self.path.display(),
                record = self.records_consumed,
                error = %err,
                "failed to decode record"
            );
            return false;
        }

        true
    }

    /// Skips the next record without decoding it.
    ///
    /// Follows the same end-of-stream and error rules as [`Reader::read`].
    pub fn skip(&mut self) -> bool {
        let limits = self.config.frame_limits();
        self.advance(|cursor| skip_frame(cursor, &limits).map(|len| (len as usize, ())))
            .is_some()
    }

    /// Returns an iterator that reads records until [`Reader::read`] stops.
    pub fn records<R: Record>(&mut self) -> Records<'_, R> {
        Records {
            reader: self,
            marker: PhantomData,
        }
    }

    /// Consumes one frame with `step`, enforcing bounds and stickiness.
    fn advance<T>(
        &mut self,
        step: impl FnOnce(&mut BackendCursor) -> Result<(usize, T), CodecError>,
    ) -> Option<T> {
        if !self.is_good || self.records_consumed >= self.records_declared {
            return None;
        }
        let cursor = self.cursor.as_mut()?;

        match step(cursor) {
            Ok((len, value)) => {
                self.records_consumed += 1;
                if len > self.config.warn_frame_size as usize {
                    warn!(
                        path = %self.path.display(),
                        bytes = len,
                        "record frame exceeds warning size"
                    );
                }
                Some(value)
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    record = self.records_consumed,
                    error = %err,
                    "framing error, input is no longer readable"
                );
                self.is_good = false;
                None
            }
        }
    }

    fn notify(&mut self, event: LifecycleEvent) {
        if let Some(mut delegate) = self.delegate.take() {
            dispatch_reader(delegate.as_mut(), event, self);
            self.delegate = Some(delegate);
        }
    }
}

impl Drop for Reader {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Reader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .field("good", &self.is_good)
            .field("records_declared", &self.records_declared)
            .field("records_consumed", &self.records_consumed)
            .finish_non_exhaustive()
    }
}

/// Iterator over the records of a [`Reader`].
///
/// Stops at end of stream or at the first record that cannot be read;
/// check [`Reader::good`] afterwards to tell the two apart.
pub struct Records<'a, R> {
    reader: &'a mut Reader,
    marker: PhantomData<R>,
}

impl<R: Record> Iterator for Records<'_, R> {
    type Item = R;

    fn next(&mut self) -> Option<R> {
        let mut record = R::default();
        self.reader.read(&mut record).then_some(record)
    }
}
