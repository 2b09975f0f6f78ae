//! Property-based test generators using proptest.

use crate::sample::SampleEvent;
use evio_core::Provenance;
use proptest::prelude::*;

/// Strategy for raw record payloads, including empty ones.
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..512)
}

/// Strategy for a stream of raw payloads.
pub fn payloads_strategy(max_records: usize) -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(payload_strategy(), 0..max_records)
}

/// Strategy for trigger names in the usual `HLT_<Object><Threshold>` form.
pub fn trigger_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("HLT_(Mu|Ele|Jet|Photon|Tau)[0-9]{1,3}")
        .expect("Invalid regex")
}

/// Strategy for provenance tags.
pub fn provenance_strategy() -> impl Strategy<Value = Provenance> {
    prop_oneof![
        Just(Provenance::Unknown),
        Just(Provenance::Data),
        Just(Provenance::MonteCarlo),
    ]
}

/// Strategy for structured sample events.
pub fn sample_event_strategy() -> impl Strategy<Value = SampleEvent> {
    (
        any::<u32>(),
        any::<u64>(),
        prop::collection::vec(any::<u64>(), 0..4),
        prop::collection::vec(any::<i32>(), 0..64),
    )
        .prop_map(|(run, event, triggers, hits)| SampleEvent {
            run,
            event,
            triggers,
            hits,
        })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests, e.g. ones touching disk.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn trigger_names_have_prefix(name in trigger_name_strategy()) {
            prop_assert!(name.starts_with("HLT_"));
        }

        #[test]
        fn payload_streams_are_bounded(payloads in payloads_strategy(8)) {
            prop_assert!(payloads.len() < 8);
            prop_assert!(payloads.iter().all(|p| p.len() < 512));
        }
    }
}
