//! Length-prefixed frames.
//!
//! A frame is a varint32 length followed by exactly that many payload bytes:
//!
//! ```text
//! | length (varint32, 1-5 bytes) | payload (length bytes) |
//! ```
//!
//! A zero length is legal and denotes an empty payload. Reading and
//! skipping a frame consume exactly the same bytes, so a stream position
//! never depends on whether a payload was decoded.

use crate::error::{CodecError, CodecResult};
use bytes::BufMut;
use std::io::{self, Read, Write};

/// Maximum number of bytes a varint32 can occupy.
pub const MAX_VARINT32_LEN: usize = 5;

/// Default ceiling on a single frame payload (1 GiB).
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 1024 * 1024 * 1024;

/// Initial buffer reserved when reading a payload.
/// The buffer grows as bytes actually arrive, so a corrupt prefix
/// cannot force a large allocation up front.
const READ_CHUNK: usize = 64 * 1024;

/// Bounds applied while reading frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLimits {
    /// Largest payload length accepted from a length prefix.
    pub max_frame_size: u32,
}

impl Default for FrameLimits {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl FrameLimits {
    /// Creates limits with the given payload ceiling.
    #[must_use]
    pub const fn new(max_frame_size: u32) -> Self {
        Self { max_frame_size }
    }

    fn check(&self, len: u32) -> CodecResult<()> {
        if len > self.max_frame_size {
            return Err(CodecError::FrameTooLarge {
                len: u64::from(len),
                max: self.max_frame_size,
            });
        }
        Ok(())
    }
}

/// A byte stream that frames can be read from.
///
/// In addition to [`Read`], a source must be able to discard bytes without
/// handing them to the caller so that skipped payloads are never
/// materialized.
pub trait FrameSource: Read {
    /// Discards exactly `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedEof` if fewer than `len` bytes remain.
    fn discard(&mut self, len: u64) -> io::Result<()>;
}

impl FrameSource for &[u8] {
    fn discard(&mut self, len: u64) -> io::Result<()> {
        let available = self.len();
        match usize::try_from(len) {
            Ok(len) if len <= available => {
                *self = &self[len..];
                Ok(())
            }
            _ => {
                *self = &self[available..];
                Err(io::Error::from(io::ErrorKind::UnexpectedEof))
            }
        }
    }
}

/// Returns the number of bytes required to encode `value` as a varint32.
#[must_use]
pub const fn varint32_len(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0x0FFF_FFFF => 4,
        _ => 5,
    }
}

/// Returns the total encoded size of a frame carrying `payload_len` bytes.
#[must_use]
pub const fn frame_len(payload_len: u32) -> u64 {
    varint32_len(payload_len) as u64 + payload_len as u64
}

/// Encodes `value` as a base-128 little-endian varint.
///
/// Returns the number of bytes written.
#[allow(clippy::cast_possible_truncation)]
pub fn encode_varint32(buf: &mut impl BufMut, mut value: u32) -> usize {
    let mut written = 1;
    while value >= 0x80 {
        buf.put_u8((value as u8 & 0x7F) | 0x80);
        value >>= 7;
        written += 1;
    }
    buf.put_u8(value as u8);
    written
}

/// Decodes a varint32 from the start of `buf`.
///
/// Returns `(value, bytes_consumed)`.
///
/// # Errors
///
/// Returns `UnexpectedEof` if `buf` ends inside the varint and
/// `MalformedVarint` if the encoding is longer than five bytes or
/// overflows 32 bits.
pub fn decode_varint32(buf: &[u8]) -> CodecResult<(u32, usize)> {
    let mut source = buf;
    let value = read_varint32(&mut source)?;
    Ok((value, buf.len() - source.len()))
}

/// Reads a varint32 from `source`, one byte at a time.
///
/// # Errors
///
/// Same as [`decode_varint32`], plus any I/O error of the source.
pub fn read_varint32<R: Read + ?Sized>(source: &mut R) -> CodecResult<u32> {
    let mut value: u32 = 0;
    for index in 0..MAX_VARINT32_LEN {
        let mut byte = [0u8; 1];
        source.read_exact(&mut byte)?;
        let byte = byte[0];

        if index == MAX_VARINT32_LEN - 1 && byte > 0x0F {
            return Err(CodecError::MalformedVarint);
        }

        value |= u32::from(byte & 0x7F) << (7 * index);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(CodecError::MalformedVarint)
}

/// Writes `payload` as one frame.
///
/// Returns the number of bytes written (prefix plus payload).
///
/// # Errors
///
/// Returns `InvalidInput` if the payload is longer than `u32::MAX`, or any
/// error of the sink.
pub fn write_frame<W: Write + ?Sized>(sink: &mut W, payload: &[u8]) -> io::Result<u64> {
    let len = u32::try_from(payload.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("frame payload of {} bytes is too large", payload.len()),
        )
    })?;

    let mut prefix = Vec::with_capacity(MAX_VARINT32_LEN);
    encode_varint32(&mut prefix, len);

    sink.write_all(&prefix)?;
    sink.write_all(payload)?;

    Ok(frame_len(len))
}

/// Reads one frame and returns its payload.
///
/// A zero-length frame yields an empty payload without touching the source
/// again.
///
/// # Errors
///
/// Returns an error if the prefix is missing or malformed, exceeds
/// `limits`, or the payload is shorter than announced.
pub fn read_frame<R: Read + ?Sized>(source: &mut R, limits: &FrameLimits) -> CodecResult<Vec<u8>> {
    let len = read_varint32(source)?;
    limits.check(len)?;

    if len == 0 {
        return Ok(Vec::new());
    }

    let expected = len as usize;
    let mut payload = Vec::with_capacity(expected.min(READ_CHUNK));
    source.take(u64::from(len)).read_to_end(&mut payload)?;

    if payload.len() != expected {
        return Err(CodecError::UnexpectedEof);
    }

    Ok(payload)
}

/// Skips one frame without materializing its payload.
///
/// Consumes exactly the bytes [`read_frame`] would. Returns the payload
/// length.
///
/// # Errors
///
/// Same as [`read_frame`].
pub fn skip_frame<S: FrameSource + ?Sized>(
    source: &mut S,
    limits: &FrameLimits,
) -> CodecResult<u32> {
    let len = read_varint32(source)?;
    limits.check(len)?;

    if len > 0 {
        source.discard(u64::from(len))?;
    }

    Ok(len)
}
