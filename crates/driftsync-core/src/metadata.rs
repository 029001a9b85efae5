//! Transfer metadata announcement.
//!
//! The first message on the wire: the sender announces the file name, its
//! size in bytes and the derived chunk count. The message is unframed and
//! must fit the receiver's fixed control buffer.

use crate::error::CoreError;
use crate::{CHUNK_SIZE, CONTROL_BUFFER_SIZE, DELIMITER};

/// Metadata for one file transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// File name (base name, no directory components)
    pub name: String,
    /// File size in bytes
    pub size: u64,
    /// Number of chunks, `size.div_ceil(CHUNK_SIZE)`
    pub total_chunks: u64,
}

impl Metadata {
    /// Create metadata for a file of the given name and size.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidIdentifier`] if the name contains the
    /// field delimiter, and [`CoreError::MetadataTooLarge`] if the encoded
    /// message would not fit the control buffer.
    pub fn new(name: impl Into<String>, size: u64) -> Result<Self, CoreError> {
        let name = name.into();
        if name.contains(DELIMITER) {
            return Err(CoreError::InvalidIdentifier(name));
        }

        let metadata = Self {
            name,
            size,
            total_chunks: chunk_count(size),
        };

        // Fail at construction rather than on the wire.
        metadata.encode()?;

        Ok(metadata)
    }

    /// Byte length of the chunk at `position`.
    ///
    /// Every chunk is `CHUNK_SIZE` bytes except the final one, which holds
    /// the remainder.
    #[must_use]
    pub fn chunk_len(&self, position: u64) -> u64 {
        if position + 1 == self.total_chunks {
            self.size - position * CHUNK_SIZE
        } else {
            CHUNK_SIZE
        }
    }

    /// Encode as the unframed wire message.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MetadataTooLarge`] when the message exceeds
    /// [`CONTROL_BUFFER_SIZE`].
    pub fn encode(&self) -> Result<Vec<u8>, CoreError> {
        let message = format!(
            "{}{DELIMITER}{}{DELIMITER}{}",
            self.name, self.size, self.total_chunks
        );

        if message.len() > CONTROL_BUFFER_SIZE {
            return Err(CoreError::MetadataTooLarge {
                limit: CONTROL_BUFFER_SIZE,
                actual: message.len(),
            });
        }

        Ok(message.into_bytes())
    }

    /// Decode a received metadata message.
    ///
    /// The chunk count is recomputed from the size field; a trailing chunk
    /// count in the message is not trusted.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedMetadata`] when fewer than two fields
    /// are present, the name is empty, or the size is not a non-negative
    /// integer.
    pub fn decode(bytes: &[u8]) -> Result<Self, CoreError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| CoreError::MalformedMetadata("not valid UTF-8".into()))?;

        let mut fields = text.splitn(3, DELIMITER);
        let name = fields
            .next()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| CoreError::MalformedMetadata("missing name field".into()))?;
        let size_field = fields
            .next()
            .ok_or_else(|| CoreError::MalformedMetadata("missing size field".into()))?;

        let size: u64 = size_field
            .parse()
            .map_err(|_| CoreError::MalformedMetadata(format!("invalid size {size_field:?}")))?;

        Ok(Self {
            name: name.to_string(),
            size,
            total_chunks: chunk_count(size),
        })
    }
}

/// Number of chunks needed for `size` bytes
#[must_use]
pub fn chunk_count(size: u64) -> u64 {
    size.div_ceil(CHUNK_SIZE)
}
