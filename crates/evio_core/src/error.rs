//! Error types for evio core.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while writing or reading event files.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] evio_storage::StorageError),

    /// Frame or payload codec error.
    #[error("codec error: {0}")]
    Codec(#[from] evio_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No output filename can be derived from the configured base path.
    #[error("failed to generate output filename: base path is empty")]
    NoOutputPath,

    /// Every candidate output filename already exists.
    #[error("failed to generate output filename for {base:?}: {attempts} candidates already exist")]
    FilenameExhausted {
        /// The configured base path.
        base: PathBuf,
        /// Number of candidates probed.
        attempts: u32,
    },

    /// The writer has no open output file.
    #[error("output file is not open")]
    NotOpen,

    /// A failed append left bytes in the output file that could not be
    /// discarded. The file cannot be finished.
    #[error("output file {path:?} holds a partial record that could not be discarded")]
    Poisoned {
        /// The damaged output file.
        path: PathBuf,
    },

    /// The input path is empty.
    #[error("input filename is empty")]
    NoInputPath,

    /// The input file does not exist.
    #[error("input file does not exist: {path:?}")]
    InputNotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The file does not follow the event file layout.
    #[error("invalid event file format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}
