//! Failure injection for storage backends.
//!
//! [`CrashableBackend`] wraps another backend and makes one append fail
//! part way through, leaving a torn write behind, the way a full disk or a
//! yanked device would.

use evio_storage::{StorageBackend, StorageError, StorageResult};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Shared switch controlling when a [`CrashableBackend`] fails.
#[derive(Debug)]
pub struct CrashSwitch {
    /// Remaining bytes accepted before the failure; `u64::MAX` disarms.
    crash_after_bytes: AtomicU64,
    crashed: AtomicBool,
    fail_on_sync: AtomicBool,
    fail_on_truncate: AtomicBool,
}

impl CrashSwitch {
    /// Creates a disarmed switch.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            crash_after_bytes: AtomicU64::new(u64::MAX),
            crashed: AtomicBool::new(false),
            fail_on_sync: AtomicBool::new(false),
            fail_on_truncate: AtomicBool::new(false),
        })
    }

    /// Fails the append that crosses `bytes` more bytes from now.
    ///
    /// The failing append still writes the bytes up to the threshold. The
    /// switch disarms itself after firing.
    pub fn crash_after(&self, bytes: u64) {
        self.crash_after_bytes.store(bytes, Ordering::SeqCst);
    }

    /// Sets whether `flush` and `sync` should fail.
    pub fn set_fail_on_sync(&self, fail: bool) {
        self.fail_on_sync.store(fail, Ordering::SeqCst);
    }

    /// Sets whether `truncate` should fail, leaving torn bytes in place.
    pub fn set_fail_on_truncate(&self, fail: bool) {
        self.fail_on_truncate.store(fail, Ordering::SeqCst);
    }

    /// Returns whether a failure has been injected.
    pub fn has_crashed(&self) -> bool {
        self.crashed.load(Ordering::SeqCst)
    }
}

/// A storage backend wrapper that can simulate torn writes.
pub struct CrashableBackend {
    inner: Box<dyn StorageBackend>,
    switch: Arc<CrashSwitch>,
}

impl CrashableBackend {
    /// Wraps `inner`, failing according to `switch`.
    pub fn new(inner: Box<dyn StorageBackend>, switch: Arc<CrashSwitch>) -> Self {
        Self { inner, switch }
    }
}

fn simulated(what: &str) -> StorageError {
    StorageError::Io(io::Error::new(
        io::ErrorKind::Other,
        format!("simulated crash during {what}"),
    ))
}

impl StorageBackend for CrashableBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        self.inner.read_at(offset, len)
    }

    fn append(&mut self, bytes: &[u8]) -> StorageResult<u64> {
        let threshold = self.switch.crash_after_bytes.load(Ordering::SeqCst);
        let len = bytes.len() as u64;

        if len <= threshold {
            if threshold != u64::MAX {
                self.switch
                    .crash_after_bytes
                    .store(threshold - len, Ordering::SeqCst);
            }
            return self.inner.append(bytes);
        }

        self.switch.crash_after_bytes.store(u64::MAX, Ordering::SeqCst);
        self.switch.crashed.store(true, Ordering::SeqCst);
        if threshold > 0 {
            let _ = self.inner.append(&bytes[..threshold as usize]);
        }
        Err(simulated("append"))
    }

    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> StorageResult<()> {
        self.inner.write_at(offset, bytes)
    }

    fn flush(&mut self) -> StorageResult<()> {
        if self.switch.fail_on_sync.load(Ordering::SeqCst) {
            self.switch.crashed.store(true, Ordering::SeqCst);
            return Err(simulated("flush"));
        }
        self.inner.flush()
    }

    fn size(&self) -> StorageResult<u64> {
        self.inner.size()
    }

    fn sync(&mut self) -> StorageResult<()> {
        if self.switch.fail_on_sync.load(Ordering::SeqCst) {
            self.switch.crashed.store(true, Ordering::SeqCst);
            return Err(simulated("sync"));
        }
        self.inner.sync()
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        if self.switch.fail_on_truncate.load(Ordering::SeqCst) {
            return Err(simulated("truncate"));
        }
        self.inner.truncate(new_size)
    }
}
