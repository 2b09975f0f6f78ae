//! Sequential, buffered reads over a storage backend.
//!
//! Backends only offer positional reads. The cursor turns them into a
//! [`Read`] stream the frame codec can consume, keeping a read-ahead buffer
//! so that byte-at-a-time varint decoding does not hit the OS per byte.

use evio_codec::FrameSource;
use evio_storage::{StorageBackend, StorageError};
use std::io::{self, Read};

/// Read-ahead buffer size.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// A forward-and-seekable read position over a backend.
pub(crate) struct BackendCursor {
    backend: Box<dyn StorageBackend>,
    /// Total size of the backend at construction.
    size: u64,
    /// Absolute position of the next byte handed out.
    position: u64,
    buffer: Vec<u8>,
    /// Absolute offset of `buffer[0]`.
    buffer_start: u64,
}

impl BackendCursor {
    pub(crate) fn new(backend: Box<dyn StorageBackend>) -> Result<Self, StorageError> {
        let size = backend.size()?;
        Ok(Self {
            backend,
            size,
            position: 0,
            buffer: Vec::new(),
            buffer_start: 0,
        })
    }

    pub(crate) const fn position(&self) -> u64 {
        self.position
    }

    pub(crate) const fn size(&self) -> u64 {
        self.size
    }

    pub(crate) const fn remaining(&self) -> u64 {
        self.size.saturating_sub(self.position)
    }

    /// Moves to an absolute position. Positions past the end are clamped.
    pub(crate) fn seek_to(&mut self, position: u64) {
        self.position = position.min(self.size);
    }

    /// Bytes of the buffer at or after the current position.
    fn buffered(&self) -> &[u8] {
        let end = self.buffer_start + self.buffer.len() as u64;
        if self.position < self.buffer_start || self.position >= end {
            return &[];
        }
        let start = (self.position - self.buffer_start) as usize;
        &self.buffer[start..]
    }

    fn refill(&mut self) -> io::Result<()> {
        let len = self.remaining().min(READ_BUFFER_SIZE as u64) as usize;
        self.buffer = self.backend.read_at(self.position, len).map_err(into_io)?;
        self.buffer_start = self.position;
        Ok(())
    }
}

impl Read for BackendCursor {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.remaining() == 0 {
            return Ok(0);
        }

        if self.buffered().is_empty() {
            // Large reads bypass the buffer entirely.
            if buf.len() >= READ_BUFFER_SIZE {
                let len = self.remaining().min(buf.len() as u64) as usize;
                let data = self.backend.read_at(self.position, len).map_err(into_io)?;
                buf[..len].copy_from_slice(&data);
                self.position += len as u64;
                return Ok(len);
            }
            self.refill()?;
        }

        let available = self.buffered();
        let len = available.len().min(buf.len());
        buf[..len].copy_from_slice(&available[..len]);
        self.position += len as u64;
        Ok(len)
    }
}

impl FrameSource for BackendCursor {
    fn discard(&mut self, len: u64) -> io::Result<()> {
        if len > self.remaining() {
            self.position = self.size;
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
        }
        self.position += len;
        Ok(())
    }
}

fn into_io(err: StorageError) -> io::Error {
    match err {
        StorageError::Io(err) => err,
        StorageError::ReadPastEnd { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, err),
        other => io::Error::new(io::ErrorKind::Other, other),
    }
}
