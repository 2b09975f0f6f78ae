//! # evio Codec
//!
//! Framing and payload encoding for evio event files.
//!
//! This crate provides:
//! - Length-prefixed frames (`varint32` length + payload), see [`frame`]
//! - The [`Record`] capability used by writers and readers
//! - CBOR helpers for structured payloads ([`Cbor`], [`to_cbor`], [`from_cbor`])
//!
//! ## Usage
//!
//! ```
//! use evio_codec::{read_frame, write_frame, FrameLimits};
//!
//! let mut stream = Vec::new();
//! write_frame(&mut stream, b"event").unwrap();
//!
//! let mut source = stream.as_slice();
//! let payload = read_frame(&mut source, &FrameLimits::default()).unwrap();
//! assert_eq!(payload, b"event");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
pub mod frame;
mod record;

pub use error::{CodecError, CodecResult};
pub use frame::{
    decode_varint32, encode_varint32, frame_len, read_frame, read_varint32, skip_frame,
    varint32_len, write_frame, FrameLimits, FrameSource, DEFAULT_MAX_FRAME_SIZE,
};
pub use record::{from_cbor, to_cbor, Cbor, Record};
