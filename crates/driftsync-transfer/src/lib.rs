//! # Driftsync Transfer
//!
//! Sender and receiver state machines for the driftsync transfer
//! protocol.
//!
//! One TCP connection carries one transfer. The receiver accepts a single
//! peer per run, decides between rejecting, starting fresh or resuming
//! from persisted progress, then writes chunks at their absolute offsets
//! as they arrive. The sender announces metadata, obeys the receiver's
//! single control reply and pushes the needed chunks in ascending order
//! with no per-packet acknowledgment.
//!
//! ## Receiver states
//!
//! ```text
//! AwaitConnection → ReceiveMetadata → ┬─ Reject          (terminal)
//!                                     ├─ NewTransfer   ─┐
//!                                     └─ ResumeTransfer ┴→ Receiving → ┬─ Complete
//!                                                                      └─ Aborted
//! ```
//!
//! All awaits are sequential; there is no pipelined or parallel chunk
//! transmission. Ordering and flow control come from the TCP stream.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod receiver;
pub mod sender;

pub use error::TransferError;
pub use receiver::{Receiver, TransferOutcome};
pub use sender::{SendReport, Sender};
