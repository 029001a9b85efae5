//! Directory snapshots.
//!
//! A snapshot is a point-in-time view of a directory tree: one flat map
//! from absolute file path to stat metadata plus the ordered per-chunk
//! content hash list. Subdirectories contribute their own absolute-path
//! keys to the same map. Hidden entries and the persisted index file are
//! skipped.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::debug;

use driftsync_files::hasher;

use crate::error::WatchError;

/// Name of the persisted index file, excluded from snapshots
pub const INDEX_FILE_NAME: &str = "sync-index.json";

/// Stat metadata for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    /// Base file name
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Creation time, seconds since the Unix epoch (0 if unavailable)
    pub created: u64,
    /// Modification time, seconds since the Unix epoch
    pub modified: u64,
}

/// One file's entry in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Stat metadata
    pub stat: FileStat,
    /// Ordered per-chunk hex digests, one per chunk
    pub chunk_hashes: Vec<String>,
}

impl SnapshotEntry {
    /// Whether two entries hold byte-identical content
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.chunk_hashes == other.chunk_hashes
    }
}

/// Flat, ordered mapping from absolute path to entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// All files, keyed by absolute path
    pub files: BTreeMap<PathBuf, SnapshotEntry>,
}

impl Snapshot {
    /// Number of files
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the snapshot holds no files
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Entry for a path
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&SnapshotEntry> {
        self.files.get(path)
    }

    /// Insert or replace a path's entry
    pub fn upsert(&mut self, path: PathBuf, entry: SnapshotEntry) {
        self.files.insert(path, entry);
    }

    /// Remove a path's entry
    pub fn remove(&mut self, path: &Path) -> Option<SnapshotEntry> {
        self.files.remove(path)
    }
}

/// Whether a directory entry is excluded from snapshots.
///
/// Hidden names (leading dot) and the index file itself never appear in
/// a snapshot.
#[must_use]
pub fn is_excluded_name(name: &str) -> bool {
    name.starts_with('.') || name == INDEX_FILE_NAME
}

/// Build the entry for a single regular file: stat plus chunk hashes.
///
/// # Errors
///
/// Returns an error if the file cannot be stat'd or read.
pub fn scan_entry(path: &Path) -> Result<SnapshotEntry, WatchError> {
    let metadata = fs::metadata(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let stat = FileStat {
        name,
        size: metadata.len(),
        created: metadata.created().ok().map_or(0, epoch_secs),
        modified: metadata.modified().map(epoch_secs)?,
    };

    let chunk_hashes = hasher::chunk_hashes(path)?;

    Ok(SnapshotEntry { stat, chunk_hashes })
}

/// Walk a tree into one flat snapshot.
///
/// # Errors
///
/// Returns an error if a directory cannot be read or a file cannot be
/// hashed.
pub fn build_snapshot(root: &Path) -> Result<Snapshot, WatchError> {
    let mut snapshot = Snapshot::default();
    walk_into(root, &mut snapshot)?;
    debug!(root = %root.display(), files = snapshot.len(), "built snapshot");
    Ok(snapshot)
}

fn walk_into(dir: &Path, snapshot: &mut Snapshot) -> Result<(), WatchError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if is_excluded_name(&name.to_string_lossy()) {
            continue;
        }

        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            // Subdirectory contents land in the same flat map.
            walk_into(&path, snapshot)?;
        } else if file_type.is_file() {
            snapshot.upsert(path.clone(), scan_entry(&path)?);
        }
    }
    Ok(())
}

fn epoch_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}
