//! On-disk layout constants.
//!
//! ```text
//! offset 0..8     footer pointer   u64 little-endian, length of the record region
//! offset 8..8+P   record frames    varint32 length + payload, repeated
//! offset 8+P..    metadata frame   one frame holding the CBOR metadata block
//! ```

/// Size of the footer pointer at the start of every file.
pub const FOOTER_POINTER_SIZE: u64 = 8;

/// Bytes per kilobyte in the rollover budget.
pub const KILOBYTE: u64 = 1000;

/// Offset of the metadata frame for a given footer pointer value.
#[must_use]
pub const fn metadata_offset(footer_pointer: u64) -> u64 {
    FOOTER_POINTER_SIZE.saturating_add(footer_pointer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_follows_record_region() {
        assert_eq!(metadata_offset(0), 8);
        assert_eq!(metadata_offset(2020), 2028);
        assert_eq!(metadata_offset(u64::MAX), u64::MAX);
    }
}
