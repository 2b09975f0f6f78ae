//! Delegate hooks, close semantics and torn writes.

use evio_core::{CoreError, Provenance, Reader, ReaderConfig, StampProvenance, Writer};
use evio_storage::{FileBackend, StorageBackend, StorageResult};
use evio_testkit::prelude::*;
use std::path::Path;

#[test]
fn writer_hooks_fire_in_order() {
    let dir = TestDir::new();
    let log = HookLog::new();

    let mut writer = Writer::new(dir.base("run.evio"), fast_config());
    writer.set_delegate(Some(Box::new(LoggingWriterDelegate::new(log.clone()))));
    writer.open().unwrap();
    writer.write(&b"event".to_vec());
    writer.close().unwrap();

    assert_eq!(
        log.entries(),
        vec!["will_open:1", "did_open:1", "will_close:1", "did_close:1"]
    );
}

#[test]
fn rollover_fires_close_then_open() {
    let dir = TestDir::new();
    let log = HookLog::new();

    let mut writer = Writer::new(dir.base("run.evio"), small_files());
    writer.set_delegate(Some(Box::new(LoggingWriterDelegate::new(log.clone()))));
    writer.open().unwrap();
    for _ in 0..11 {
        assert!(writer.write(&vec![0u8; 100]));
    }
    writer.close().unwrap();

    assert_eq!(
        log.entries(),
        vec![
            "will_open:1",
            "did_open:1",
            "will_close:1",
            "did_close:1",
            "will_open:2",
            "did_open:2",
            "will_close:2",
            "did_close:2",
        ]
    );
}

#[test]
fn detached_delegate_sees_nothing() {
    let dir = TestDir::new();
    let log = HookLog::new();

    let mut writer = Writer::new(dir.base("run.evio"), fast_config());
    writer.set_delegate(Some(Box::new(LoggingWriterDelegate::new(log.clone()))));
    assert!(writer.delegate().is_some());
    writer.set_delegate(None);
    assert!(writer.delegate().is_none());

    writer.open().unwrap();
    writer.close().unwrap();
    assert!(log.entries().is_empty());
}

#[test]
fn provenance_stamped_on_open_is_persisted() {
    let dir = TestDir::new();
    let mut writer = Writer::new(dir.base("run.evio"), small_files());
    writer.set_delegate(Some(Box::new(StampProvenance::new(Provenance::MonteCarlo))));
    writer.open().unwrap();
    for _ in 0..15 {
        assert!(writer.write(&vec![3u8; 100]));
    }
    writer.close().unwrap();

    assert_eq!(writer.files_written().len(), 2);
    for file in writer.files_written() {
        let reader = Reader::open(file).unwrap();
        assert_eq!(reader.metadata().provenance(), Provenance::MonteCarlo);
        assert!(reader.metadata().created_at() > 0);
    }
}

#[test]
fn reader_hooks_fire_in_order() {
    let dir = TestDir::new();
    let files = write_records(
        &dir.base("run.evio"),
        &[b"a".to_vec(), b"b".to_vec()],
        fast_config(),
    );
    let log = HookLog::new();

    let mut reader = Reader::open_with(
        &files[0],
        ReaderConfig::default(),
        Some(Box::new(LoggingReaderDelegate::new(log.clone()))),
    )
    .unwrap();
    assert_eq!(log.entries(), vec!["will_open", "did_open:2"]);

    assert!(reader.skip());
    drop(reader);
    assert_eq!(
        log.entries(),
        vec!["will_open", "did_open:2", "will_close:1", "did_close"]
    );
}

#[test]
fn close_is_idempotent() {
    let dir = TestDir::new();
    let mut writer = Writer::new(dir.base("run.evio"), fast_config());
    writer.open().unwrap();
    writer.write(&b"once".to_vec());
    writer.close().unwrap();

    let path = writer.files_written()[0].clone();
    let before = std::fs::read(&path).unwrap();
    writer.close().unwrap();
    drop(writer);
    assert_eq!(std::fs::read(&path).unwrap(), before);

    let mut reader = Reader::open(&path).unwrap();
    reader.close();
    reader.close();
    assert!(!reader.is_open());
}

#[test]
fn torn_write_is_discarded() {
    let dir = TestDir::new();
    let switch = CrashSwitch::new();
    let opener_switch = switch.clone();

    let mut writer = Writer::with_opener(
        dir.base("run.evio"),
        fast_config(),
        Box::new(move |path: &Path| -> StorageResult<Box<dyn StorageBackend>> {
            let file = FileBackend::create(path)?;
            Ok(Box::new(CrashableBackend::new(Box::new(file), opener_switch.clone())))
        }),
    );
    writer.open().unwrap();
    assert!(writer.write(&b"abc".to_vec()));

    switch.crash_after(2);
    assert!(!writer.write(&b"defgh".to_vec()));
    assert!(switch.has_crashed());
    assert_eq!(writer.metadata().events(), 1);
    assert_eq!(writer.record_bytes(), 4);

    assert!(writer.write(&b"ij".to_vec()));
    writer.close().unwrap();

    let path = &writer.files_written()[0];
    assert_eq!(footer_pointer(path), 4 + 3);
    assert_eq!(
        read_records::<Vec<u8>>(path),
        vec![b"abc".to_vec(), b"ij".to_vec()]
    );
}

#[test]
fn unrecoverable_torn_write_poisons_the_file() {
    let dir = TestDir::new();
    let switch = CrashSwitch::new();
    let opener_switch = switch.clone();

    let mut writer = Writer::with_opener(
        dir.base("run.evio"),
        fast_config(),
        Box::new(move |path: &Path| -> StorageResult<Box<dyn StorageBackend>> {
            let file = FileBackend::create(path)?;
            Ok(Box::new(CrashableBackend::new(Box::new(file), opener_switch.clone())))
        }),
    );
    writer.open().unwrap();
    assert!(writer.write(&b"abc".to_vec()));

    switch.set_fail_on_truncate(true);
    switch.crash_after(2);
    assert!(!writer.write(&b"defgh".to_vec()));

    // Nothing more lands after the torn bytes.
    assert!(!writer.write(&b"ij".to_vec()));
    let err = writer.try_write(&b"ij".to_vec()).unwrap_err();
    assert!(matches!(err, CoreError::Poisoned { .. }));
    assert_eq!(writer.metadata().events(), 1);

    let path = writer.filename().unwrap().to_path_buf();
    assert!(matches!(writer.close(), Err(CoreError::Poisoned { .. })));
    assert!(!writer.is_open());
    assert!(writer.files_written().is_empty());
    assert!(Reader::open(&path).is_err());

    // The next file is unaffected.
    switch.set_fail_on_truncate(false);
    writer.open().unwrap();
    assert!(writer.write(&b"kl".to_vec()));
    writer.close().unwrap();
    assert_eq!(
        read_records::<Vec<u8>>(&writer.files_written()[0]),
        vec![b"kl".to_vec()]
    );
}

#[test]
fn failed_footer_leaves_writer_closed() {
    let dir = TestDir::new();
    let switch = CrashSwitch::new();
    let opener_switch = switch.clone();

    let mut writer = Writer::with_opener(
        dir.base("run.evio"),
        fast_config(),
        Box::new(move |path: &Path| -> StorageResult<Box<dyn StorageBackend>> {
            let file = FileBackend::create(path)?;
            Ok(Box::new(CrashableBackend::new(Box::new(file), opener_switch.clone())))
        }),
    );
    writer.open().unwrap();
    writer.write(&b"abc".to_vec());

    switch.set_fail_on_sync(true);
    assert!(writer.close().is_err());
    assert!(!writer.is_open());
    assert!(writer.files_written().is_empty());

    // The next open starts a fresh file.
    switch.set_fail_on_sync(false);
    writer.open().unwrap();
    assert_eq!(writer.file_sequence(), 2);
    assert_eq!(writer.metadata().events(), 0);
}
