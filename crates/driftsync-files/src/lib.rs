//! # Driftsync Files
//!
//! Chunk-granular file I/O for driftsync.
//!
//! This crate provides:
//! - Positional chunk reads for the sending side
//! - Preallocating, offset-addressed chunk writes for the receiving side
//! - Per-chunk content hashing
//! - The progress store that makes interrupted transfers resumable

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunker;
pub mod error;
pub mod hasher;
pub mod progress;

pub use chunker::{ChunkReader, ChunkWriter};
pub use error::FilesError;
pub use progress::ProgressStore;
