//! Error types for the transfer state machines.

use std::path::PathBuf;

use thiserror::Error;

use driftsync_core::CoreError;
use driftsync_files::FilesError;

/// Transfer-level errors
#[derive(Debug, Error)]
pub enum TransferError {
    /// Wire protocol failure
    #[error("protocol error: {0}")]
    Core(#[from] CoreError),

    /// Chunk file or resume-state failure
    #[error("file error: {0}")]
    Files(#[from] FilesError),

    /// Socket failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Receiver refused the transfer; the sender must not retry
    #[error("transfer rejected by receiver: {0}")]
    Rejected(String),

    /// Peer closed the connection during the control exchange
    #[error("connection closed during control exchange")]
    ConnectionClosed,

    /// Source file missing at send time
    #[error("source file not found: {0}")]
    SourceMissing(PathBuf),
}
