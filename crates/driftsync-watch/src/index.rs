//! Persisted directory index.
//!
//! The last known snapshot is kept as a JSON document at the watched
//! root. On startup it is loaded and diffed against a fresh walk to
//! surface changes that happened while the process was down. A missing
//! or unreadable index is treated as empty rather than fatal, so a first
//! run (or a corrupted index) degrades to "everything is new".

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::WatchError;
use crate::snapshot::{INDEX_FILE_NAME, Snapshot};

/// Snapshot persistence at a watched root
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    /// Index store for the given root directory
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            path: root.join(INDEX_FILE_NAME),
        }
    }

    /// Path of the index file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(&self) -> Result<Snapshot, WatchError> {
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Load the persisted snapshot, degrading to an empty one when the
    /// index is missing or unreadable.
    #[must_use]
    pub fn load_or_empty(&self) -> Snapshot {
        match self.load() {
            Ok(snapshot) => {
                debug!(path = %self.path.display(), files = snapshot.len(), "loaded index");
                snapshot
            }
            Err(err) => {
                warn!(path = %self.path.display(), %err, "no usable index, starting empty");
                Snapshot::default()
            }
        }
    }

    /// Persist a snapshot atomically (temp file + rename).
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, writing or renaming fails.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), WatchError> {
        let contents = serde_json::to_vec_pretty(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), files = snapshot.len(), "saved index");
        Ok(())
    }
}
