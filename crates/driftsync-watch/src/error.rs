//! Error types for snapshots, diffing and watching.

use thiserror::Error;

use driftsync_files::FilesError;

/// Watch-layer errors
#[derive(Debug, Error)]
pub enum WatchError {
    /// Underlying filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted index could not be serialized or deserialized
    #[error("index error: {0}")]
    Index(#[from] serde_json::Error),

    /// Filesystem notification backend failure
    #[error("watcher error: {0}")]
    Watcher(#[from] notify::Error),

    /// Chunk hashing failure
    #[error("file error: {0}")]
    Files(#[from] FilesError),
}
