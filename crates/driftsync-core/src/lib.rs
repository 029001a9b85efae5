//! # Driftsync Core
//!
//! Wire protocol for the driftsync transfer subsystem.
//!
//! This crate provides:
//! - Metadata announcement encoding and decoding
//! - Length-framed, zlib-compressed chunk packets
//! - Control reply encoding and the sender-side reply policy
//! - Protocol error types
//!
//! ## Wire layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Metadata (unframed, ≤ 1024 bytes)                            │
//! │   <name>#%E&T<size>#%E&T<total chunks>                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Control reply (unframed)                                     │
//! │   ERROR: … | START_NEW_TRANSFER | MISSING_PACKETS#%E&T1,2,…  │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Packet frame                                                 │
//! │   u32 big-endian length ‖ zlib(<id>#%E&T<pos>#%E&T<payload>) │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! All traffic flows over a single TCP connection; the metadata message
//! and control reply are exchanged once, then packets are pushed one way.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod metadata;
pub mod packet;
pub mod reply;

pub use error::CoreError;
pub use metadata::Metadata;
pub use packet::Packet;
pub use reply::ControlReply;

/// Fixed chunk size for transfers and content hashing (4 MiB)
pub const CHUNK_SIZE: u64 = 4 * 1024 * 1024;

/// Field delimiter inside metadata messages and packet headers.
///
/// The sequence is assumed never to occur in file names or packet
/// identifiers; encoders reject values that would violate this.
pub const DELIMITER: &str = "#%E&T";

/// Size of the unframed read buffer used for metadata and control replies
pub const CONTROL_BUFFER_SIZE: usize = 1024;

/// Size of the length prefix in front of each packet frame
pub const FRAME_LEN_SIZE: usize = 4;

/// Packet identifier carried by file chunk payloads
pub const FILE_IDENTIFIER: &str = "FILE";
