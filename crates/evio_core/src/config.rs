//! Writer and reader configuration.

use crate::format::KILOBYTE;
use evio_codec::{FrameLimits, DEFAULT_MAX_FRAME_SIZE};

/// Default output file budget, in kilobytes (1 KB = 1000 bytes).
pub const DEFAULT_MAX_FILE_SIZE_KB: u32 = 10_000;

/// Default number of filename candidates probed per open.
pub const DEFAULT_MAX_FILENAME_ATTEMPTS: u32 = 5;

/// Default frame size above which readers log a warning (900 MiB).
pub const DEFAULT_WARN_FRAME_SIZE: u32 = 900 * 1024 * 1024;

/// Configuration for a [`crate::Writer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    /// Record-region budget per output file, in kilobytes of 1000 bytes.
    ///
    /// A write that finds more than `max_file_size_kb * 1000` bytes of
    /// records already in the file rolls over to a new file first.
    pub max_file_size_kb: u32,

    /// How many candidate filenames are probed before `open` gives up.
    pub max_filename_attempts: u32,

    /// Whether to `fsync` each file when it is closed.
    pub sync_on_close: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            max_file_size_kb: DEFAULT_MAX_FILE_SIZE_KB,
            max_filename_attempts: DEFAULT_MAX_FILENAME_ATTEMPTS,
            sync_on_close: true,
        }
    }
}

impl WriterConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-file budget in kilobytes.
    #[must_use]
    pub const fn max_file_size_kb(mut self, kb: u32) -> Self {
        self.max_file_size_kb = kb;
        self
    }

    /// Sets the number of filename candidates probed per open.
    #[must_use]
    pub const fn max_filename_attempts(mut self, attempts: u32) -> Self {
        self.max_filename_attempts = attempts;
        self
    }

    /// Sets whether to sync each file on close.
    #[must_use]
    pub const fn sync_on_close(mut self, value: bool) -> Self {
        self.sync_on_close = value;
        self
    }

    /// Returns the budget in bytes.
    #[must_use]
    pub const fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_kb as u64 * KILOBYTE
    }
}

/// Configuration for a [`crate::Reader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Largest frame payload accepted. Longer prefixes are treated as
    /// corruption rather than allocated.
    pub max_frame_size: u32,

    /// Frames larger than this are read but logged.
    pub warn_frame_size: u32,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            warn_frame_size: DEFAULT_WARN_FRAME_SIZE,
        }
    }
}

impl ReaderConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum frame payload size.
    #[must_use]
    pub const fn max_frame_size(mut self, size: u32) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Sets the frame size above which a warning is logged.
    #[must_use]
    pub const fn warn_frame_size(mut self, size: u32) -> Self {
        self.warn_frame_size = size;
        self
    }

    /// Returns the frame limits used by the codec.
    #[must_use]
    pub const fn frame_limits(&self) -> FrameLimits {
        FrameLimits::new(self.max_frame_size)
    }
}
