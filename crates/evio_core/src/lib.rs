//! # evio Core
//!
//! Writer and reader for self-describing event files.
//!
//! An event file is a stream of length-prefixed record frames followed by a
//! metadata frame. The first eight bytes point past the records to that
//! metadata, so a reader learns the record count, provenance and trigger
//! index before it reads the first record. See [`format`] for the layout.
//!
//! This crate provides:
//! - [`Writer`]: appends records, rolls over to new files, writes the footer
//! - [`Reader`]: opens a file footer-first and reads or skips records
//! - [`MetadataBlock`]: the per-file summary
//! - [`WriterDelegate`] / [`ReaderDelegate`]: file lifecycle hooks
//!
//! ## Example
//!
//! ```no_run
//! use evio_core::{Reader, Writer, WriterConfig};
//!
//! let mut writer = Writer::new("run.evio", WriterConfig::default());
//! writer.open().unwrap();
//! writer.metadata_mut().add_trigger("HLT_Mu15");
//! writer.write(&b"event".to_vec());
//! writer.close().unwrap();
//!
//! let mut reader = Reader::open("run_1.evio").unwrap();
//! let mut event = Vec::new();
//! while reader.read(&mut event) {
//!     println!("{} bytes", event.len());
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod cursor;
mod delegate;
mod error;
pub mod format;
mod metadata;
mod naming;
mod reader;
mod writer;

pub use config::{
    ReaderConfig, WriterConfig, DEFAULT_MAX_FILENAME_ATTEMPTS, DEFAULT_MAX_FILE_SIZE_KB,
    DEFAULT_WARN_FRAME_SIZE,
};
pub use delegate::{ReaderDelegate, StampProvenance, WriterDelegate, WriterFile};
pub use error::{CoreError, CoreResult};
pub use metadata::{trigger_hash, MetadataBlock, Provenance, TriggerItem};
pub use naming::FilenameSequencer;
pub use reader::{Reader, Records};
pub use writer::{BackendOpener, Writer};

// Re-export the record capability so producers need only this crate.
pub use evio_codec::{Cbor, Record};
