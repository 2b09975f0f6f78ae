//! # evio Testkit
//!
//! Test utilities for evio event files.
//!
//! This crate provides:
//! - Temporary directories and write/read helpers ([`fixtures`])
//! - A structured sample record, [`SampleEvent`]
//! - Delegates that log lifecycle hooks
//! - A storage backend that fails part way through a write ([`crash`])
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use evio_testkit::prelude::*;
//!
//! #[test]
//! fn roundtrip() {
//!     let dir = TestDir::new();
//!     let files = write_records(&dir.base("run.evio"), &[b"a".to_vec()], small_files());
//!     assert_eq!(read_records::<Vec<u8>>(&files[0]), vec![b"a".to_vec()]);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crash;
pub mod fixtures;
pub mod generators;
mod sample;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::crash::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::sample::SampleEvent;
}

pub use crash::*;
pub use fixtures::*;
pub use generators::*;
pub use sample::SampleEvent;
