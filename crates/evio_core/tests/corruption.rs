//! Damaged and unfinished files.

use evio_codec::write_frame;
use evio_core::{CoreError, Reader, ReaderConfig};
use evio_testkit::prelude::*;

fn written_file(dir: &TestDir, records: &[Vec<u8>]) -> std::path::PathBuf {
    let files = write_records(&dir.base("run.evio"), records, fast_config());
    files[0].clone()
}

#[test]
fn every_truncation_fails_to_open() {
    let dir = TestDir::new();
    let path = written_file(&dir, &[b"first".to_vec(), b"second".to_vec()]);
    let bytes = std::fs::read(&path).unwrap();

    let cut = dir.base("cut.evio");
    for len in 0..bytes.len() {
        std::fs::write(&cut, &bytes[..len]).unwrap();
        assert!(
            matches!(Reader::open(&cut), Err(CoreError::InvalidFormat { .. })),
            "prefix of {len} bytes opened"
        );
    }

    std::fs::write(&cut, &bytes).unwrap();
    assert!(Reader::open(&cut).is_ok());
}

#[test]
fn truncated_in_place() {
    let dir = TestDir::new();
    let path = written_file(&dir, &[vec![9u8; 300]]);

    truncate_file(&path, 100);
    assert!(Reader::open(&path).is_err());
}

#[test]
fn pointer_beyond_file() {
    let dir = TestDir::new();
    let path = written_file(&dir, &[b"abc".to_vec()]);

    overwrite_byte(&path, 7, 0x7F);
    assert!(matches!(
        Reader::open(&path),
        Err(CoreError::InvalidFormat { .. })
    ));
}

#[test]
fn unfinished_file_is_rejected() {
    // Placeholder pointer never backpatched, no metadata frame.
    let dir = TestDir::new();
    let path = dir.base("unfinished_1.evio");
    let mut bytes = 0u64.to_le_bytes().to_vec();
    write_frame(&mut bytes, b"abc").unwrap();
    std::fs::write(&path, bytes).unwrap();

    assert!(matches!(
        Reader::open(&path),
        Err(CoreError::InvalidFormat { .. })
    ));
}

#[test]
fn missing_and_empty_paths() {
    let dir = TestDir::new();
    assert!(matches!(Reader::open(""), Err(CoreError::NoInputPath)));
    assert!(matches!(
        Reader::open(dir.base("absent.evio")),
        Err(CoreError::InputNotFound { .. })
    ));
}

#[test]
fn record_length_past_footer_is_sticky() {
    let dir = TestDir::new();
    let path = written_file(&dir, &[vec![5u8; 10]]);

    // Claim 127 bytes; only the 10-byte payload and the footer follow.
    overwrite_byte(&path, 8, 0x7F);

    let mut reader = Reader::open(&path).unwrap();
    let mut record = Vec::new();
    assert!(!reader.read(&mut record));
    assert!(!reader.good());
    assert!(!reader.read(&mut record));
    assert_eq!(reader.records_consumed(), 0);
}

#[test]
fn oversized_frame_is_rejected_without_allocating() {
    let dir = TestDir::new();
    let path = written_file(&dir, &[vec![1u8; 500], b"tail".to_vec()]);

    let config = ReaderConfig::new().max_frame_size(256);
    let mut reader = Reader::open_with(&path, config, None).unwrap();

    assert!(!reader.skip());
    assert!(!reader.good());
}
