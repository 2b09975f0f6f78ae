//! The metadata block stored as the last frame of every event file.
//!
//! The block is accumulated in memory while a file is open and serialized
//! exactly once, when the file is closed. It is encoded as a CBOR map so
//! that fields can be added without breaking older readers; missing fields
//! decode to their defaults.

use evio_codec::{from_cbor, to_cbor, CodecResult, Record};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Where the events in a file come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Not stamped by the producer.
    #[default]
    Unknown,
    /// Recorded collision data.
    Data,
    /// Simulated events.
    MonteCarlo,
}

impl Provenance {
    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Data => "data",
            Self::MonteCarlo => "mc",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provenance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unknown" | "" => Ok(Self::Unknown),
            "data" => Ok(Self::Data),
            "mc" | "montecarlo" | "monte_carlo" => Ok(Self::MonteCarlo),
            other => Err(format!("unknown provenance: {other}")),
        }
    }
}

/// Computes the stable key used to deduplicate trigger items.
///
/// The key is the first eight bytes (big-endian) of the SHA-256 digest of
/// the UTF-8 name, so it is identical across platforms and runs.
#[must_use]
pub fn trigger_hash(name: &str) -> u64 {
    let digest = Sha256::digest(name.as_bytes());
    let mut key = [0u8; 8];
    key.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(key)
}

/// A named item in the auxiliary index, referenced from records by hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerItem {
    /// Stable key, see [`trigger_hash`].
    pub hash: u64,
    /// Human-readable trigger name.
    pub name: String,
}

impl TriggerItem {
    /// Creates an item keyed by the hash of its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            hash: trigger_hash(&name),
            name,
        }
    }
}

/// File-level summary written as the footer of every event file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataBlock {
    #[serde(default)]
    events: u32,
    #[serde(default)]
    provenance: Provenance,
    #[serde(default)]
    created_at: u64,
    #[serde(default)]
    triggers: Vec<TriggerItem>,
}

impl MetadataBlock {
    /// Creates an empty block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the block for the next file of a rollover sequence.
    ///
    /// The record count, provenance and timestamp start over; the trigger
    /// index is carried so that every file describes the triggers its
    /// records may reference.
    #[must_use]
    pub fn carry_over(&self) -> Self {
        Self {
            triggers: self.triggers.clone(),
            ..Self::default()
        }
    }

    /// Number of records in the file.
    #[must_use]
    pub const fn events(&self) -> u32 {
        self.events
    }

    /// Overrides the record count.
    pub fn set_events(&mut self, events: u32) {
        self.events = events;
    }

    /// Counts one more record. Returns `false` if the counter is saturated.
    pub fn record_event(&mut self) -> bool {
        match self.events.checked_add(1) {
            Some(events) => {
                self.events = events;
                true
            }
            None => false,
        }
    }

    /// The provenance tag.
    #[must_use]
    pub const fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// Sets the provenance tag.
    pub fn set_provenance(&mut self, provenance: Provenance) {
        self.provenance = provenance;
    }

    /// Creation time in seconds since the Unix epoch, `0` if unset.
    #[must_use]
    pub const fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Sets the creation time in seconds since the Unix epoch.
    pub fn set_created_at(&mut self, seconds: u64) {
        self.created_at = seconds;
    }

    /// Sets the creation time to now.
    pub fn stamp_now(&mut self) {
        self.created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
    }

    /// The auxiliary trigger index, in insertion order.
    #[must_use]
    pub fn triggers(&self) -> &[TriggerItem] {
        &self.triggers
    }

    /// Looks up a trigger by hash.
    #[must_use]
    pub fn trigger(&self, hash: u64) -> Option<&TriggerItem> {
        self.triggers.iter().find(|item| item.hash == hash)
    }

    /// Adds a trigger by name. Returns the hash and whether it was new.
    pub fn add_trigger(&mut self, name: impl Into<String>) -> (u64, bool) {
        let item = TriggerItem::new(name);
        let hash = item.hash;
        (hash, self.add_trigger_item(item))
    }

    /// Adds a trigger item unless one with the same hash is present.
    pub fn add_trigger_item(&mut self, item: TriggerItem) -> bool {
        if self.trigger(item.hash).is_some() {
            return false;
        }
        self.triggers.push(item);
        true
    }

    /// Removes every trigger item.
    pub fn clear_triggers(&mut self) {
        self.triggers.clear();
    }
}

impl Record for MetadataBlock {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        to_cbor(self)
    }

    fn decode(&mut self, bytes: &[u8]) -> CodecResult<()> {
        *self = from_cbor(bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_block_roundtrip() {
        let block = MetadataBlock::new();
        let bytes = block.encode().unwrap();

        let mut decoded = MetadataBlock::new();
        decoded.decode(&bytes).unwrap();
        assert_eq!(decoded, block);
    }

    #[test]
    fn populated_block_roundtrip() {
        let mut block = MetadataBlock::new();
        block.set_events(1234);
        block.set_provenance(Provenance::MonteCarlo);
        block.set_created_at(1_300_000_000);
        block.add_trigger("HLT_Mu15");
        block.add_trigger("HLT_Ele27");

        let bytes = block.encode().unwrap();
        let mut decoded = MetadataBlock::new();
        decoded.decode(&bytes).unwrap();

        assert_eq!(decoded, block);
        assert_eq!(decoded.events(), 1234);
        assert_eq!(decoded.triggers()[1].name, "HLT_Ele27");
    }

    #[test]
    fn missing_fields_decode_to_defaults() {
        #[derive(Serialize)]
        struct Partial {
            events: u32,
        }

        let bytes = to_cbor(&Partial { events: 7 }).unwrap();
        let mut decoded = MetadataBlock::new();
        decoded.decode(&bytes).unwrap();

        assert_eq!(decoded.events(), 7);
        assert_eq!(decoded.provenance(), Provenance::Unknown);
        assert!(decoded.triggers().is_empty());
    }

    #[test]
    fn garbage_fails_to_decode() {
        let mut decoded = MetadataBlock::new();
        assert!(decoded.decode(&[0x01, 0x02, 0x03]).is_err());
    }

    #[test]
    fn triggers_are_deduplicated_by_hash() {
        let mut block = MetadataBlock::new();

        let (first, inserted) = block.add_trigger("HLT_Jet30");
        assert!(inserted);

        let (second, inserted) = block.add_trigger("HLT_Jet30");
        assert!(!inserted);
        assert_eq!(first, second);

        block.add_trigger("HLT_Jet60");
        assert_eq!(block.triggers().len(), 2);
        assert_eq!(block.trigger(first).unwrap().name, "HLT_Jet30");
    }

    #[test]
    fn trigger_hash_is_stable() {
        assert_eq!(trigger_hash("HLT_Mu15"), trigger_hash("HLT_Mu15"));
        assert_ne!(trigger_hash("HLT_Mu15"), trigger_hash("HLT_Mu17"));
        // SHA-256("") starts with e3b0c442 98fc1c14
        assert_eq!(trigger_hash(""), 0xe3b0_c442_98fc_1c14);
    }

    #[test]
    fn carry_over_keeps_only_triggers() {
        let mut block = MetadataBlock::new();
        block.set_events(10);
        block.set_provenance(Provenance::Data);
        block.stamp_now();
        block.add_trigger("HLT_Photon20");

        let next = block.carry_over();
        assert_eq!(next.events(), 0);
        assert_eq!(next.provenance(), Provenance::Unknown);
        assert_eq!(next.created_at(), 0);
        assert_eq!(next.triggers(), block.triggers());
    }

    #[test]
    fn record_event_saturates() {
        let mut block = MetadataBlock::new();
        assert!(block.record_event());
        assert_eq!(block.events(), 1);

        block.set_events(u32::MAX);
        assert!(!block.record_event());
        assert_eq!(block.events(), u32::MAX);
    }

    #[test]
    fn provenance_parsing() {
        assert_eq!("DATA".parse::<Provenance>().unwrap(), Provenance::Data);
        assert_eq!("mc".parse::<Provenance>().unwrap(), Provenance::MonteCarlo);
        assert_eq!("MonteCarlo".parse::<Provenance>().unwrap(), Provenance::MonteCarlo);
        assert!("cosmics".parse::<Provenance>().is_err());
        assert_eq!(Provenance::MonteCarlo.to_string(), "mc");
    }
}
