//! Resume state persistence.
//!
//! For every in-flight target file the receiver keeps a plain-text
//! progress record listing the chunk positions not yet written, one
//! decimal per line, sorted ascending. The record lives next to the
//! target as `<name>.progress`, is created when a transfer starts, is
//! rewritten when a transfer aborts, and is deleted on completion. Its
//! presence is what turns a later run into a resume.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::FilesError;

/// Suffix appended to the target file name
pub const PROGRESS_SUFFIX: &str = ".progress";

/// Persisted set of missing chunk positions for one target file
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    /// Progress store colocated with the given target file
    #[must_use]
    pub fn for_target(target: &Path) -> Self {
        let mut name = target.as_os_str().to_os_string();
        name.push(PROGRESS_SUFFIX);
        Self { path: name.into() }
    }

    /// Path of the progress record
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a progress record exists for the target
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create a record covering every position `0..total_chunks` and
    /// return the full missing set.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    pub fn init_full(&self, total_chunks: u64) -> Result<BTreeSet<u64>, FilesError> {
        let missing: BTreeSet<u64> = (0..total_chunks).collect();
        self.save(&missing)?;
        debug!(path = %self.path.display(), total_chunks, "created progress record");
        Ok(missing)
    }

    /// Load the persisted missing set.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::CorruptProgress`] when a line does not parse
    /// as a chunk position, or an I/O error if the record cannot be read.
    pub fn load(&self) -> Result<BTreeSet<u64>, FilesError> {
        let contents = fs::read_to_string(&self.path)?;
        let mut missing = BTreeSet::new();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let position = line.parse().map_err(|_| FilesError::CorruptProgress {
                path: self.path.clone(),
                reason: format!("invalid position line {line:?}"),
            })?;
            missing.insert(position);
        }

        Ok(missing)
    }

    /// Rewrite the record with the current missing set, atomically
    /// (temp file + rename) so a crash cannot leave a half-written
    /// record behind.
    ///
    /// # Errors
    ///
    /// Returns an error if writing or renaming fails.
    pub fn save(&self, missing: &BTreeSet<u64>) -> Result<(), FilesError> {
        let mut contents = String::with_capacity(missing.len() * 8);
        for position in missing {
            let _ = writeln!(contents, "{position}");
        }

        let tmp = self.path.with_extension("progress.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Remove the record after a completed transfer.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails for a reason other than the
    /// record already being gone.
    pub fn clear(&self) -> Result<(), FilesError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "removed progress record");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
