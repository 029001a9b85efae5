//! Control replies sent by the receiver after the metadata exchange.
//!
//! A single unframed reply decides the sender's behavior: abort, resume
//! with an explicit position list, or stream the whole file.

use crate::error::CoreError;
use crate::DELIMITER;

/// Rejection message sent when the target exists with no resume state
pub const ALREADY_EXISTS: &str = "File already exists";

const ERROR_PREFIX: &str = "ERROR: ";
const START_NEW: &str = "START_NEW_TRANSFER";
const MISSING_PREFIX: &str = "MISSING_PACKETS";

/// Receiver's reply to a metadata announcement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlReply {
    /// Transfer refused; the sender must abort without retrying
    Error(String),
    /// Fresh transfer; the sender streams every position
    StartNew,
    /// Resume; the sender streams exactly these positions
    MissingPackets(Vec<u64>),
}

impl ControlReply {
    /// Encode as the unframed wire message
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Error(message) => format!("{ERROR_PREFIX}{message}").into_bytes(),
            Self::StartNew => START_NEW.as_bytes().to_vec(),
            Self::MissingPackets(positions) => {
                let list = positions
                    .iter()
                    .map(u64::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                format!("{MISSING_PREFIX}{DELIMITER}{list}").into_bytes()
            }
        }
    }

    /// Decode a reply, applying the sender's reply policy: anything
    /// starting with `ERROR` aborts, `MISSING_PACKETS` carries an explicit
    /// position list, and any other reply means "send everything".
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnparseableReply`] when a `MISSING_PACKETS`
    /// reply carries a malformed position list.
    pub fn decode(bytes: &[u8]) -> Result<Self, CoreError> {
        let text = String::from_utf8_lossy(bytes);

        if let Some(message) = text.strip_prefix("ERROR") {
            let message = message.trim_start_matches(':').trim();
            return Ok(Self::Error(message.to_string()));
        }

        if text.starts_with(MISSING_PREFIX) {
            let list = text
                .split_once(DELIMITER)
                .map(|(_, rest)| rest)
                .ok_or_else(|| CoreError::UnparseableReply(text.to_string()))?;

            if list.is_empty() {
                return Ok(Self::MissingPackets(Vec::new()));
            }

            let positions = list
                .split(',')
                .map(|field| field.trim().parse::<u64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| CoreError::UnparseableReply(text.to_string()))?;
            return Ok(Self::MissingPackets(positions));
        }

        Ok(Self::StartNew)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_wire_format() {
        let reply = ControlReply::Error(ALREADY_EXISTS.to_string());
        assert_eq!(reply.encode(), b"ERROR: File already exists");
    }

    #[test]
    fn test_start_new_wire_format() {
        assert_eq!(ControlReply::StartNew.encode(), b"START_NEW_TRANSFER");
    }

    #[test]
    fn test_missing_packets_wire_format() {
        let reply = ControlReply::MissingPackets(vec![0, 4, 17]);
        assert_eq!(reply.encode(), b"MISSING_PACKETS#%E&T0,4,17");
    }

    #[test]
    fn test_roundtrip() {
        for reply in [
            ControlReply::Error(ALREADY_EXISTS.to_string()),
            ControlReply::StartNew,
            ControlReply::MissingPackets(vec![1, 2, 3]),
            ControlReply::MissingPackets(Vec::new()),
        ] {
            assert_eq!(ControlReply::decode(&reply.encode()).unwrap(), reply);
        }
    }

    #[test]
    fn test_unknown_reply_means_start_new() {
        assert_eq!(
            ControlReply::decode(b"HELLO").unwrap(),
            ControlReply::StartNew
        );
    }

    #[test]
    fn test_malformed_position_list_rejected() {
        let message = format!("{MISSING_PREFIX}{DELIMITER}1,two,3");
        assert!(matches!(
            ControlReply::decode(message.as_bytes()),
            Err(CoreError::UnparseableReply(_))
        ));
    }
}
