//! Verify command implementation.

use evio_core::format::metadata_offset;
use evio_core::Reader;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Verification result for one file.
#[derive(Debug)]
pub struct VerifyResult {
    /// File path.
    pub path: PathBuf,
    /// Records the footer declares.
    pub declared: u32,
    /// Records skipped before the stream ended.
    pub skipped: u32,
    /// List of errors found.
    pub errors: Vec<String>,
}

impl VerifyResult {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            declared: 0,
            skipped: 0,
            errors: Vec::new(),
        }
    }

    /// Returns `true` if no problem was found.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs the verify command.
pub fn run(files: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    let mut failed = 0;
    for path in files {
        let result = verify_file(path);
        print_result(&result);
        if !result.is_ok() {
            failed += 1;
        }
    }

    println!();
    if failed == 0 {
        println!("✓ {} file(s) verified", files.len());
        Ok(())
    } else {
        println!("✗ {failed} of {} file(s) failed verification", files.len());
        Err("Verification failed".into())
    }
}

/// Skips through every record of `path` and checks the stream against
/// its footer.
pub fn verify_file(path: &Path) -> VerifyResult {
    let mut result = VerifyResult::new(path);
    debug!(path = %path.display(), "verifying");

    let mut reader = match Reader::open(path) {
        Ok(reader) => reader,
        Err(err) => {
            result.errors.push(format!("Failed to open: {err}"));
            return result;
        }
    };

    result.declared = reader.records_declared();
    while reader.skip() {}
    result.skipped = reader.records_consumed();

    if !reader.good() {
        result
            .errors
            .push(format!("Framing error after {} records", result.skipped));
        return result;
    }

    if result.skipped != result.declared {
        result.errors.push(format!(
            "Record count mismatch: footer declares {}, found {}",
            result.declared, result.skipped
        ));
    }

    let expected_end = metadata_offset(reader.footer_pointer());
    match reader.position() {
        Some(end) if end == expected_end => {}
        Some(end) => result.errors.push(format!(
            "Records end at offset {end}, footer starts at {expected_end}"
        )),
        None => result.errors.push("Reader closed unexpectedly".to_string()),
    }

    result
}

fn print_result(result: &VerifyResult) {
    if result.is_ok() {
        println!("  {}: {} records OK", result.path.display(), result.skipped);
        return;
    }

    println!("  {}: FAILED", result.path.display());
    for error in &result.errors {
        println!("    - {error}");
    }
}
