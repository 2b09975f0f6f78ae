//! A structured record used across the test suites.

use evio_codec::{from_cbor, to_cbor, CodecResult, Record};
use serde::{Deserialize, Serialize};

/// A small physics-style event: identifiers, fired triggers and hit data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleEvent {
    /// Run number.
    pub run: u32,
    /// Event number within the run.
    pub event: u64,
    /// Hashes of the triggers that fired, see `evio_core::trigger_hash`.
    pub triggers: Vec<u64>,
    /// Detector hit amplitudes.
    pub hits: Vec<i32>,
}

impl SampleEvent {
    /// Creates an event with no triggers or hits.
    #[must_use]
    pub fn new(run: u32, event: u64) -> Self {
        Self {
            run,
            event,
            ..Self::default()
        }
    }

    /// Creates a deterministic event for position `n` in a test stream.
    #[must_use]
    pub fn numbered(n: u64) -> Self {
        let hits = (0..(n % 7) as i32).map(|i| i * 31 - 40).collect();
        Self {
            run: 1,
            event: n,
            triggers: Vec::new(),
            hits,
        }
    }

    /// Adds a fired trigger.
    #[must_use]
    pub fn with_trigger(mut self, hash: u64) -> Self {
        self.triggers.push(hash);
        self
    }
}

impl Record for SampleEvent {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        to_cbor(self)
    }

    fn decode(&mut self, bytes: &[u8]) -> CodecResult<()> {
        *self = from_cbor(bytes)?;
        Ok(())
    }
}
