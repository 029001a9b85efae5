//! Live snapshot engine.
//!
//! Owns the in-memory snapshot behind a lock and applies watcher events
//! to it. The run loop is the single writer; any thread may query the
//! current state through [`WatchEngine::snapshot`]. This replaces the
//! shared-global-dictionary arrangement the design notes flag as a data
//! race: construction and teardown are explicit, and every mutation goes
//! through one synchronized owner.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::error::WatchError;
use crate::snapshot::{Snapshot, scan_entry};
use crate::watcher::{DirWatcher, FsEvent};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Single-writer owner of the live snapshot
pub struct WatchEngine {
    root: PathBuf,
    live: Arc<RwLock<Snapshot>>,
}

impl WatchEngine {
    /// Engine seeded with an already-built snapshot of `root`
    #[must_use]
    pub fn new(root: PathBuf, initial: Snapshot) -> Self {
        Self {
            root,
            live: Arc::new(RwLock::new(initial)),
        }
    }

    /// Root directory this engine tracks
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Clone of the current live snapshot
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.live.read().clone()
    }

    /// Number of files currently tracked
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.live.read().len()
    }

    /// Apply one filesystem event to the live snapshot.
    ///
    /// Creations and modifications recompute the single path's entry and
    /// upsert it under its absolute key; deletions drop the key. The map
    /// stays flat regardless of how deeply the path nests.
    ///
    /// # Errors
    ///
    /// Returns an error if the changed file cannot be stat'd or hashed.
    pub fn apply(&self, event: &FsEvent) -> Result<(), WatchError> {
        match event {
            FsEvent::Created(path) | FsEvent::Modified(path) => {
                if !path.is_file() {
                    // Raced with a delete or points at a non-regular file.
                    debug!(path = %path.display(), "skipping event for non-file path");
                    return Ok(());
                }
                let entry = scan_entry(path)?;
                debug!(path = %path.display(), chunks = entry.chunk_hashes.len(), "upserting entry");
                self.live.write().upsert(path.clone(), entry);
            }
            FsEvent::Deleted(path) => {
                if self.live.write().remove(path).is_some() {
                    debug!(path = %path.display(), "removed entry");
                }
            }
        }
        Ok(())
    }

    /// Consume watcher events until `stop` is raised.
    ///
    /// Per-event failures are logged and skipped; the loop only ends on
    /// the stop flag, which the process's termination path raises for a
    /// clean shutdown.
    pub fn run(&self, watcher: &DirWatcher, stop: &AtomicBool) {
        info!(root = %self.root.display(), files = self.file_count(), "watch loop started");

        while !stop.load(Ordering::Relaxed) {
            let Some(event) = watcher.recv_timeout(POLL_INTERVAL) else {
                continue;
            };
            if let Err(err) = self.apply(&event) {
                warn!(path = %event.path().display(), %err, "failed to apply event");
            }
        }

        info!(files = self.file_count(), "watch loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::build_snapshot;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_apply_created_upserts_flat_key() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        let engine = WatchEngine::new(dir.path().to_path_buf(), Snapshot::default());

        let path = dir.path().join("nested/deep.txt");
        fs::write(&path, b"payload").unwrap();
        engine.apply(&FsEvent::Created(path.clone())).unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.len(), 1);
        // Flat absolute key, no per-directory nesting.
        assert!(snapshot.get(&path).is_some());
    }

    #[test]
    fn test_apply_modified_refreshes_entry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.txt");
        fs::write(&path, b"v1").unwrap();

        let initial = build_snapshot(dir.path()).unwrap();
        let engine = WatchEngine::new(dir.path().to_path_buf(), initial);
        let before = engine.snapshot().get(&path).unwrap().clone();

        fs::write(&path, b"v2 is longer").unwrap();
        engine.apply(&FsEvent::Modified(path.clone())).unwrap();

        let after = engine.snapshot().get(&path).unwrap().clone();
        assert_ne!(before.chunk_hashes, after.chunk_hashes);
        assert_eq!(after.stat.size, 12);
    }

    #[test]
    fn test_apply_deleted_removes_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.txt");
        fs::write(&path, b"data").unwrap();

        let initial = build_snapshot(dir.path()).unwrap();
        let engine = WatchEngine::new(dir.path().to_path_buf(), initial);
        assert_eq!(engine.file_count(), 1);

        fs::remove_file(&path).unwrap();
        engine.apply(&FsEvent::Deleted(path.clone())).unwrap();
        assert_eq!(engine.file_count(), 0);
    }

    #[test]
    fn test_apply_vanished_file_is_not_fatal() {
        let dir = tempdir().unwrap();
        let engine = WatchEngine::new(dir.path().to_path_buf(), Snapshot::default());

        let ghost = dir.path().join("already-gone.txt");
        engine.apply(&FsEvent::Created(ghost)).unwrap();
        assert_eq!(engine.file_count(), 0);
    }
}
