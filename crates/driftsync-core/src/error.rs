//! Error types for the driftsync wire protocol.

use thiserror::Error;

/// Protocol-level errors
#[derive(Debug, Error)]
pub enum CoreError {
    /// Metadata message could not be decoded
    #[error("malformed metadata: {0}")]
    MalformedMetadata(String),

    /// Encoded metadata does not fit the control read buffer
    #[error("metadata message is {actual} bytes, exceeds the {limit}-byte control buffer")]
    MetadataTooLarge {
        /// Buffer ceiling the message must fit
        limit: usize,
        /// Encoded message size
        actual: usize,
    },

    /// Packet frame could not be decompressed or parsed
    #[error("corrupt packet: {0}")]
    CorruptPacket(String),

    /// Identifier or file name contains the field delimiter
    #[error("value contains the field delimiter: {0:?}")]
    InvalidIdentifier(String),

    /// Control reply recognized but unparseable
    #[error("unparseable control reply: {0:?}")]
    UnparseableReply(String),
}
