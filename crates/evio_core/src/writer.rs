//! Event file writer.
//!
//! A [`Writer`] appends record frames to a sequence of output files derived
//! from one base path. Each file starts with an 8-byte placeholder that is
//! overwritten with the record-region length when the file is closed, right
//! after the metadata frame is appended.
//!
//! When the record region of the current file has grown past the configured
//! budget, the next write closes it and continues in a fresh file
//! (rollover). The check happens before the record is encoded, so a file
//! may exceed the budget by at most one frame.

use crate::config::WriterConfig;
use crate::delegate::{dispatch_writer, LifecycleEvent, WriterDelegate, WriterFile};
use crate::error::{CoreError, CoreResult};
use crate::format::FOOTER_POINTER_SIZE;
use crate::metadata::MetadataBlock;
use crate::naming::FilenameSequencer;
use evio_codec::frame::MAX_VARINT32_LEN;
use evio_codec::{write_frame, Record};
use evio_storage::{FileBackend, StorageBackend, StorageResult};
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// Creates the storage for a freshly chosen output path.
pub type BackendOpener = Box<dyn FnMut(&Path) -> StorageResult<Box<dyn StorageBackend>> + Send>;

/// The output file currently being written.
struct OutputFile {
    path: PathBuf,
    backend: Box<dyn StorageBackend>,
    /// Set when a torn append could not be rolled back.
    poisoned: bool,
}

fn create_file(path: &Path) -> StorageResult<Box<dyn StorageBackend>> {
    Ok(Box::new(FileBackend::create(path)?))
}

/// Writes records into rolling event files.
///
/// # Example
///
/// ```no_run
/// use evio_core::{Writer, WriterConfig};
///
/// let mut writer = Writer::new("runs/ttbar.evio", WriterConfig::default());
/// writer.open().unwrap();
/// writer.write(&b"event payload".to_vec());
/// writer.close().unwrap();
/// ```
pub struct Writer {
    config: WriterConfig,
    opener: BackendOpener,
    sequencer: FilenameSequencer,
    output: Option<OutputFile>,
    metadata: MetadataBlock,
    /// Bytes of record frames in the current file, excluding the pointer.
    record_bytes: u64,
    files_written: Vec<PathBuf>,
    delegate: Option<Box<dyn WriterDelegate>>,
}

impl Writer {
    /// Creates a closed writer for `base_path`.
    ///
    /// Nothing touches the filesystem until [`Writer::open`].
    pub fn new(base_path: impl Into<PathBuf>, config: WriterConfig) -> Self {
        Self::with_opener(base_path, config, Box::new(create_file))
    }

    /// Creates a closed writer whose output files are created by `opener`.
    ///
    /// Filenames are still sequenced against the filesystem; `opener` only
    /// decides what storage backs each chosen path.
    pub fn with_opener(
        base_path: impl Into<PathBuf>,
        config: WriterConfig,
        opener: BackendOpener,
    ) -> Self {
        let sequencer = FilenameSequencer::new(base_path, config.max_filename_attempts);
        Self {
            config,
            opener,
            sequencer,
            output: None,
            metadata: MetadataBlock::default(),
            record_bytes: 0,
            files_written: Vec::new(),
            delegate: None,
        }
    }

    /// Opens the next output file.
    ///
    /// Calling `open` on an open writer logs a warning and does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if no output filename can be derived or the file
    /// cannot be created. The writer stays closed.
    pub fn open(&mut self) -> CoreResult<()> {
        if let Some(output) = &self.output {
            warn!(path = %output.path.display(), "output file is already open");
            return Ok(());
        }

        let path = match self.sequencer.next_path() {
            Ok(path) => path,
            Err(err) => {
                warn!(
                    base = %self.sequencer.base().display(),
                    error = %err,
                    "failed to open output file"
                );
                return Err(err);
            }
        };

        self.notify(LifecycleEvent::WillOpen, &path);

        let mut backend = (self.opener)(&path)?;
        backend.append(&0u64.to_le_bytes())?;

        self.metadata = self.metadata.carry_over();
        self.record_bytes = 0;
        self.output = Some(OutputFile {
            path: path.clone(),
            backend,
            poisoned: false,
        });

        self.notify(LifecycleEvent::DidOpen, &path);

        debug!(path = %path.display(), sequence = self.sequencer.sequence(), "opened output file");
        Ok(())
    }

    /// Writes one record, rolling over first if the current file is full.
    ///
    /// Returns `false` (and logs why) if the writer is closed, the record
    /// fails to encode, or the output cannot be written.
    pub fn write<R: Record>(&mut self, record: &R) -> bool {
        match self.try_write(record) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "failed to write record");
                false
            }
        }
    }

    /// Writes one record, reporting failures as errors.
    ///
    /// # Errors
    ///
    /// - `NotOpen` if no output file is open
    /// - `Poisoned` if an earlier torn append could not be rolled back
    /// - `InvalidOperation` if the record counter would overflow
    /// - `Codec` if the record fails to encode
    /// - `Storage`/`Io` if rollover or the append fails
    ///
    /// On error the record count and record region are unchanged.
    pub fn try_write<R: Record>(&mut self, record: &R) -> CoreResult<()> {
        let Some(output) = &self.output else {
            return Err(CoreError::NotOpen);
        };
        if output.poisoned {
            return Err(CoreError::Poisoned {
                path: output.path.clone(),
            });
        }

        if self.record_bytes > self.config.max_file_size_bytes() {
            debug!(
                record_bytes = self.record_bytes,
                budget_kb = self.config.max_file_size_kb,
                "rolling over to a new output file"
            );
            self.close()?;
            self.open()?;
        }

        if self.metadata.events() == u32::MAX {
            return Err(CoreError::invalid_operation("record counter is saturated"));
        }

        let payload = record.encode()?;
        let mut frame = Vec::with_capacity(MAX_VARINT32_LEN + payload.len());
        let frame_len = write_frame(&mut frame, &payload)?;

        let Some(output) = self.output.as_mut() else {
            return Err(CoreError::NotOpen);
        };

        if let Err(err) = output.backend.append(&frame) {
            // Drop whatever part of the frame made it out.
            let keep = FOOTER_POINTER_SIZE + self.record_bytes;
            if let Err(truncate_err) = output.backend.truncate(keep) {
                error!(
                    path = %output.path.display(),
                    error = %truncate_err,
                    "failed to discard partial frame; output file is unusable"
                );
                output.poisoned = true;
            }
            return Err(err.into());
        }

        self.record_bytes += frame_len;
        self.metadata.record_event();
        Ok(())
    }

    /// Finishes the current output file.
    ///
    /// Appends the metadata frame, backpatches the footer pointer and
    /// releases the file. Closing a closed writer does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the footer cannot be written, or `Poisoned` if
    /// the file holds a partial record. The file is released either way,
    /// the writer is closed, and a failed file is not listed in
    /// [`Writer::files_written`].
    pub fn close(&mut self) -> CoreResult<()> {
        let Some(mut output) = self.output.take() else {
            debug!("close called with no open output file");
            return Ok(());
        };

        self.notify(LifecycleEvent::WillClose, &output.path);

        let result = if output.poisoned {
            Err(CoreError::Poisoned {
                path: output.path.clone(),
            })
        } else {
            self.finish(output.backend.as_mut())
        };
        let OutputFile { path, backend, .. } = output;
        drop(backend);

        match &result {
            Ok(()) => {
                debug!(
                    path = %path.display(),
                    events = self.metadata.events(),
                    record_bytes = self.record_bytes,
                    "closed output file"
                );
                self.files_written.push(path.clone());
            }
            Err(err) => warn!(path = %path.display(), error = %err, "failed to finish output file"),
        }

        self.notify(LifecycleEvent::DidClose, &path);
        result
    }

    fn finish(&self, backend: &mut dyn StorageBackend) -> CoreResult<()> {
        let payload = self.metadata.encode()?;
        let mut frame = Vec::with_capacity(MAX_VARINT32_LEN + payload.len());
        write_frame(&mut frame, &payload)?;

        backend.append(&frame)?;
        backend.write_at(0, &self.record_bytes.to_le_bytes())?;
        backend.flush()?;
        if self.config.sync_on_close {
            backend.sync()?;
        }
        Ok(())
    }

    fn notify(&mut self, event: LifecycleEvent, path: &Path) {
        let Some(mut delegate) = self.delegate.take() else {
            return;
        };

        let mut file = WriterFile {
            path,
            sequence: self.sequencer.sequence(),
            metadata: &mut self.metadata,
        };
        dispatch_writer(delegate.as_mut(), event, &mut file);

        // A hook cannot reach the writer, so nothing replaced the delegate.
        self.delegate = Some(delegate);
    }

    /// Returns `true` while an output file is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.output.is_some()
    }

    /// Path of the open output file.
    #[must_use]
    pub fn filename(&self) -> Option<&Path> {
        self.output.as_ref().map(|output| output.path.as_path())
    }

    /// The base path output filenames are derived from.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        self.sequencer.base()
    }

    /// The metadata block of the current (or last) file.
    #[must_use]
    pub fn metadata(&self) -> &MetadataBlock {
        &self.metadata
    }

    /// Mutable access to the metadata block, e.g. to add triggers.
    pub fn metadata_mut(&mut self) -> &mut MetadataBlock {
        &mut self.metadata
    }

    /// The last filename sequence number used.
    #[must_use]
    pub fn file_sequence(&self) -> u32 {
        self.sequencer.sequence()
    }

    /// Bytes of record frames written to the current (or last) file.
    #[must_use]
    pub fn record_bytes(&self) -> u64 {
        self.record_bytes
    }

    /// Paths of every file this writer has finished, in order.
    #[must_use]
    pub fn files_written(&self) -> &[PathBuf] {
        &self.files_written
    }

    /// The configuration this writer was created with.
    #[must_use]
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Attaches a delegate, replacing any previous one. `None` detaches.
    pub fn set_delegate(&mut self, delegate: Option<Box<dyn WriterDelegate>>) {
        self.delegate = delegate;
    }

    /// The attached delegate.
    #[must_use]
    pub fn delegate(&self) -> Option<&dyn WriterDelegate> {
        self.delegate.as_deref()
    }
}

impl Drop for Writer {
    fn drop(&mut self) {
        if !self.is_open() {
            return;
        }
        if let Err(err) = self.close() {
            error!(error = %err, "failed to close output file on drop");
        }
    }
}

impl std::fmt::Debug for Writer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writer")
            .field("base_path", &self.sequencer.base())
            .field("filename", &self.filename())
            .field("events", &self.metadata.events())
            .field("record_bytes", &self.record_bytes)
            .field("files_written", &self.files_written.len())
            .finish_non_exhaustive()
    }
}
