//! Error types for chunk file I/O and resume state.

use std::path::PathBuf;

use thiserror::Error;

/// File-layer errors
#[derive(Debug, Error)]
pub enum FilesError {
    /// Underlying filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Progress record exists but cannot be parsed
    #[error("corrupt progress record {path}: {reason}")]
    CorruptProgress {
        /// Progress file that failed to parse
        path: PathBuf,
        /// First offending line or parse failure
        reason: String,
    },

    /// Chunk position outside the file's range
    #[error("chunk position {position} out of range (file has {total_chunks} chunks)")]
    PositionOutOfRange {
        /// Requested position
        position: u64,
        /// Chunks the file actually has
        total_chunks: u64,
    },
}
