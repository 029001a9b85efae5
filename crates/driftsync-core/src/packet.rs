//! Chunk packet encoding and decoding.
//!
//! A packet carries one chunk: an identifier, the chunk's ordinal position
//! and the raw bytes. On the wire the header and payload are concatenated,
//! zlib-compressed as one blob, and framed with a 4-byte big-endian length
//! prefix. The header fields are delimiter-separated inside the blob, so
//! identifiers must never contain the delimiter sequence.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::error::CoreError;
use crate::DELIMITER;

/// One framed chunk in flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Transfer identifier (delimiter-free)
    pub identifier: String,
    /// Chunk position in `[0, total_chunks)`
    pub position: u64,
    /// Raw chunk bytes
    pub payload: Vec<u8>,
}

impl Packet {
    /// Create a packet.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidIdentifier`] if the identifier contains
    /// the field delimiter.
    pub fn new(
        identifier: impl Into<String>,
        position: u64,
        payload: Vec<u8>,
    ) -> Result<Self, CoreError> {
        let identifier = identifier.into();
        if identifier.contains(DELIMITER) {
            return Err(CoreError::InvalidIdentifier(identifier));
        }

        Ok(Self {
            identifier,
            position,
            payload,
        })
    }

    /// Encode as a complete frame: length prefix plus compressed blob.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CorruptPacket`] if compression fails.
    pub fn encode(&self) -> Result<Vec<u8>, CoreError> {
        let header = format!("{}{DELIMITER}{}{DELIMITER}", self.identifier, self.position);
        let compress_err = |e: std::io::Error| CoreError::CorruptPacket(format!("compression failed: {e}"));

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(header.as_bytes()).map_err(compress_err)?;
        encoder.write_all(&self.payload).map_err(compress_err)?;
        let blob = encoder.finish().map_err(compress_err)?;

        let mut frame = Vec::with_capacity(4 + blob.len());
        frame.extend_from_slice(&(blob.len() as u32).to_be_bytes());
        frame.extend_from_slice(&blob);
        Ok(frame)
    }

    /// Decode a compressed blob (the frame body, after the length prefix
    /// has been consumed).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CorruptPacket`] when decompression fails or
    /// the blob does not split into identifier, position and payload.
    pub fn decode(blob: &[u8]) -> Result<Self, CoreError> {
        let mut decompressed = Vec::new();
        ZlibDecoder::new(blob)
            .read_to_end(&mut decompressed)
            .map_err(|e| CoreError::CorruptPacket(format!("decompression failed: {e}")))?;

        let (identifier, position, payload) = split_header(&decompressed)
            .ok_or_else(|| CoreError::CorruptPacket("header fields missing".into()))?;

        let identifier = std::str::from_utf8(identifier)
            .map_err(|_| CoreError::CorruptPacket("identifier is not UTF-8".into()))?;
        let position = std::str::from_utf8(position)
            .ok()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| CoreError::CorruptPacket("invalid position field".into()))?;

        Ok(Self {
            identifier: identifier.to_string(),
            position,
            payload: payload.to_vec(),
        })
    }
}

/// Split `<id><DELIM><pos><DELIM><payload>` at the first two delimiter
/// occurrences. The payload may itself contain the delimiter bytes.
fn split_header(data: &[u8]) -> Option<(&[u8], &[u8], &[u8])> {
    let delimiter = DELIMITER.as_bytes();
    let first = find(data, delimiter)?;
    let rest = &data[first + delimiter.len()..];
    let second = find(rest, delimiter)?;
    Some((
        &data[..first],
        &rest[..second],
        &rest[second + delimiter.len()..],
    ))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FILE_IDENTIFIER;

    fn roundtrip(packet: &Packet) -> Packet {
        let frame = packet.encode().unwrap();
        let len = u32::from_be_bytes(frame[..4].try_into().unwrap()) as usize;
        assert_eq!(frame.len(), 4 + len);
        Packet::decode(&frame[4..]).unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let packet = Packet::new(FILE_IDENTIFIER, 7, vec![0xAB; 1024]).unwrap();
        assert_eq!(roundtrip(&packet), packet);
    }

    #[test]
    fn test_roundtrip_empty_payload() {
        let packet = Packet::new(FILE_IDENTIFIER, 0, Vec::new()).unwrap();
        assert_eq!(roundtrip(&packet), packet);
    }

    #[test]
    fn test_payload_may_contain_delimiter() {
        let mut payload = b"prefix".to_vec();
        payload.extend_from_slice(DELIMITER.as_bytes());
        payload.extend_from_slice(b"suffix");

        let packet = Packet::new(FILE_IDENTIFIER, 3, payload).unwrap();
        assert_eq!(roundtrip(&packet), packet);
    }

    #[test]
    fn test_identifier_with_delimiter_rejected() {
        assert!(matches!(
            Packet::new(format!("id{DELIMITER}"), 0, Vec::new()),
            Err(CoreError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            Packet::decode(b"definitely not zlib"),
            Err(CoreError::CorruptPacket(_))
        ));
    }

    #[test]
    fn test_decode_missing_header_fails() {
        // Valid zlib stream whose contents lack the delimiter structure
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"no delimiters here").unwrap();
        let blob = encoder.finish().unwrap();

        assert!(matches!(
            Packet::decode(&blob),
            Err(CoreError::CorruptPacket(_))
        ));
    }
}
