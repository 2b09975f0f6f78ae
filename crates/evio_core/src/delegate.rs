//! Lifecycle hooks for writers and readers.
//!
//! A delegate observes the moments a file handle changes state:
//!
//! | hook | writer | reader |
//! |---|---|---|
//! | `file_will_open` | output path chosen, file not created yet | before the file is opened |
//! | `file_did_open` | placeholder pointer written, fresh metadata | metadata parsed, positioned at first record |
//! | `file_will_close` | last chance to amend the metadata | before the handle is released |
//! | `file_did_close` | footer written, handle released | handle released |
//!
//! Every hook defaults to a no-op. At most one delegate is attached to a
//! writer or reader; setting a new one replaces the old, `None` detaches.
//!
//! Writer hooks get a [`WriterFile`] view, not the writer, so they cannot
//! call back into `open`, `write` or `close`. Reader hooks get `&Reader`,
//! which only exposes accessors.

use crate::metadata::{MetadataBlock, Provenance};
use crate::reader::Reader;
use std::path::Path;

/// Hook points shared by writers and readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LifecycleEvent {
    WillOpen,
    DidOpen,
    WillClose,
    DidClose,
}

/// The writer state visible to a [`WriterDelegate`] for the duration of
/// one hook.
#[derive(Debug)]
pub struct WriterFile<'a> {
    pub(crate) path: &'a Path,
    pub(crate) sequence: u32,
    pub(crate) metadata: &'a mut MetadataBlock,
}

impl WriterFile<'_> {
    /// Path of the output file the hook refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path
    }

    /// Sequence number used to derive the path.
    #[must_use]
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// The metadata block of the file.
    ///
    /// In `file_will_open` this is still the previous file's block; in
    /// `file_did_close` it is the block that was just written.
    #[must_use]
    pub fn metadata(&self) -> &MetadataBlock {
        &*self.metadata
    }

    /// Mutable access to the metadata block.
    ///
    /// Changes made in `file_did_close` only affect what is carried into
    /// the next file (the trigger index).
    pub fn metadata_mut(&mut self) -> &mut MetadataBlock {
        &mut *self.metadata
    }
}

/// Observer of a [`crate::Writer`]'s file boundaries.
///
/// `file_did_open` is where a producer stamps provenance and creation time;
/// `file_did_close` is where it harvests or clears the trigger index.
pub trait WriterDelegate: Send {
    /// Called before an output file is created.
    fn file_will_open(&mut self, _file: &mut WriterFile<'_>) {}

    /// Called after an output file is created and its metadata reset.
    fn file_did_open(&mut self, _file: &mut WriterFile<'_>) {}

    /// Called before the metadata block is written.
    fn file_will_close(&mut self, _file: &mut WriterFile<'_>) {}

    /// Called after the footer is written and the file released.
    fn file_did_close(&mut self, _file: &mut WriterFile<'_>) {}
}

/// Observer of a [`Reader`]'s file boundaries.
pub trait ReaderDelegate: Send {
    /// Called before the input file is opened.
    fn file_will_open(&mut self, _reader: &Reader) {}

    /// Called once the metadata is parsed and the first record is next.
    fn file_did_open(&mut self, _reader: &Reader) {}

    /// Called before the input handle is released.
    fn file_will_close(&mut self, _reader: &Reader) {}

    /// Called after the input handle is released.
    fn file_did_close(&mut self, _reader: &Reader) {}
}

/// Stamps provenance and creation time into every new output file.
#[derive(Debug, Clone, Copy)]
pub struct StampProvenance {
    provenance: Provenance,
}

impl StampProvenance {
    /// Creates a delegate stamping `provenance`.
    #[must_use]
    pub const fn new(provenance: Provenance) -> Self {
        Self { provenance }
    }
}

impl WriterDelegate for StampProvenance {
    fn file_did_open(&mut self, file: &mut WriterFile<'_>) {
        let metadata = file.metadata_mut();
        metadata.set_provenance(self.provenance);
        metadata.stamp_now();
    }
}

pub(crate) fn dispatch_writer(
    delegate: &mut dyn WriterDelegate,
    event: LifecycleEvent,
    file: &mut WriterFile<'_>,
) {
    match event {
        LifecycleEvent::WillOpen => delegate.file_will_open(file),
        LifecycleEvent::DidOpen => delegate.file_did_open(file),
        LifecycleEvent::WillClose => delegate.file_will_close(file),
        LifecycleEvent::DidClose => delegate.file_did_close(file),
    }
}

pub(crate) fn dispatch_reader(
    delegate: &mut dyn ReaderDelegate,
    event: LifecycleEvent,
    reader: &Reader,
) {
    match event {
        LifecycleEvent::WillOpen => delegate.file_will_open(reader),
        LifecycleEvent::DidOpen => delegate.file_did_open(reader),
        LifecycleEvent::WillClose => delegate.file_will_close(reader),
        LifecycleEvent::DidClose => delegate.file_did_close(reader),
    }
}
