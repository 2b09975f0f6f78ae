//! Output filename sequencing.
//!
//! A writer never writes to its base path directly. Each output file gets a
//! numeric suffix inserted before the extension:
//!
//! ```text
//! base: runs/ttbar.evio  ->  runs/ttbar_1.evio, runs/ttbar_2.evio, ...
//! ```
//!
//! Every probed candidate consumes a number, so the sequence keeps growing
//! across collisions and rollovers and a number is never handed out twice.

use crate::error::{CoreError, CoreResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Derives collision-free output filenames from a base path.
#[derive(Debug, Clone)]
pub struct FilenameSequencer {
    base: PathBuf,
    sequence: u32,
    max_attempts: u32,
}

impl FilenameSequencer {
    /// Creates a sequencer for `base` that probes at most `max_attempts`
    /// candidates per call to [`next_path`](Self::next_path).
    #[must_use]
    pub fn new(base: impl Into<PathBuf>, max_attempts: u32) -> Self {
        Self {
            base: base.into(),
            sequence: 0,
            max_attempts,
        }
    }

    /// The configured base path.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// The last number handed out or probed (0 before the first call).
    #[must_use]
    pub const fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Builds the candidate path for sequence number `n`.
    ///
    /// Returns `None` if the base path has no file stem.
    #[must_use]
    pub fn candidate(&self, n: u32) -> Option<PathBuf> {
        if self.base.as_os_str().is_empty() {
            return None;
        }

        let stem = self.base.file_stem()?;
        let mut name = OsString::from(stem);
        name.push(format!("_{n}"));
        if let Some(extension) = self.base.extension() {
            name.push(".");
            name.push(extension);
        }

        Some(self.base.with_file_name(name))
    }

    /// Returns the first candidate that does not exist yet.
    ///
    /// # Errors
    ///
    /// - `NoOutputPath` if the base path is empty or has no file stem
    /// - `FilenameExhausted` if `max_attempts` candidates all exist
    pub fn next_path(&mut self) -> CoreResult<PathBuf> {
        if self.candidate(self.sequence.saturating_add(1)).is_none() {
            return Err(CoreError::NoOutputPath);
        }

        for _ in 0..self.max_attempts {
            self.sequence = self.sequence.saturating_add(1);
            let Some(path) = self.candidate(self.sequence) else {
                return Err(CoreError::NoOutputPath);
            };

            if path.exists() {
                debug!(path = %path.display(), "output candidate exists, trying next");
                continue;
            }

            return Ok(path);
        }

        Err(CoreError::FilenameExhausted {
            base: self.base.clone(),
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn candidate_inserts_suffix_before_extension() {
        let sequencer = FilenameSequencer::new("runs/ttbar.evio", 5);
        assert_eq!(
            sequencer.candidate(3).unwrap(),
            PathBuf::from("runs/ttbar_3.evio")
        );
    }

    #[test]
    fn candidate_without_extension_or_parent() {
        let sequencer = FilenameSequencer::new("output", 5);
        assert_eq!(sequencer.candidate(1).unwrap(), PathBuf::from("output_1"));
    }

    #[test]
    fn empty_base_has_no_candidate() {
        let mut sequencer = FilenameSequencer::new("", 5);
        assert!(sequencer.candidate(1).is_none());
        assert!(matches!(sequencer.next_path(), Err(CoreError::NoOutputPath)));
        assert_eq!(sequencer.sequence(), 0);
    }

    #[test]
    fn numbers_increase_across_calls() {
        let dir = tempdir().unwrap();
        let mut sequencer = FilenameSequencer::new(dir.path().join("out.evio"), 5);

        assert_eq!(sequencer.next_path().unwrap(), dir.path().join("out_1.evio"));
        assert_eq!(sequencer.next_path().unwrap(), dir.path().join("out_2.evio"));
        assert_eq!(sequencer.sequence(), 2);
    }

    #[test]
    fn skips_existing_candidates() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("out_1.evio"), b"").unwrap();
        std::fs::write(dir.path().join("out_2.evio"), b"").unwrap();

        let mut sequencer = FilenameSequencer::new(dir.path().join("out.evio"), 5);
        assert_eq!(sequencer.next_path().unwrap(), dir.path().join("out_3.evio"));
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let dir = tempdir().unwrap();
        for n in 1..=3 {
            std::fs::write(dir.path().join(format!("out_{n}.evio")), b"").unwrap();
        }

        let mut sequencer = FilenameSequencer::new(dir.path().join("out.evio"), 3);
        let result = sequencer.next_path();
        assert!(matches!(
            result,
            Err(CoreError::FilenameExhausted { attempts: 3, .. })
        ));

        // The next call resumes after the probed numbers.
        assert_eq!(sequencer.next_path().unwrap(), dir.path().join("out_4.evio"));
    }
}
