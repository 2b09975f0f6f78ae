//! # evio Storage
//!
//! Storage backend trait and implementations for evio event files.
//!
//! Storage backends are **opaque byte stores** - they do not interpret
//! the data they store. The footer pointer, frames and metadata block
//! are all the business of `evio_core`.
//!
//! ## Design Principles
//!
//! - Backends are simple byte stores (read, append, overwrite, flush)
//! - No knowledge of frames, footers or records
//! - Must be `Send + Sync`
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral buffers
//! - [`FileBackend`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use evio_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! backend.append(&[0u8; 8]).unwrap();
//! backend.append(b"payload").unwrap();
//! backend.write_at(0, &7u64.to_le_bytes()).unwrap();
//! assert_eq!(backend.read_at(0, 1).unwrap(), vec![7]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
