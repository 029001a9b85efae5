//! # Driftsync Watch
//!
//! Directory snapshots, content-hash diffing and live filesystem
//! watching.
//!
//! This crate provides:
//! - A snapshot builder that walks a tree into one flat, absolute-path
//!   keyed map of stat metadata plus per-chunk content hashes
//! - A persisted JSON index of the last known snapshot
//! - A diff engine producing created / deleted / modified / renamed sets,
//!   with renames inferred from identical hash sequences
//! - A watcher thread feeding typed events into a single-writer engine
//!   that keeps the live snapshot current
//!
//! The snapshot is always flat: nested paths contribute their own
//! absolute-path keys to the same map, never per-directory sub-maps.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod diff;
pub mod engine;
pub mod error;
pub mod index;
pub mod snapshot;
pub mod watcher;

pub use diff::{DiffReport, diff};
pub use engine::WatchEngine;
pub use error::WatchError;
pub use index::IndexStore;
pub use snapshot::{FileStat, INDEX_FILE_NAME, Snapshot, SnapshotEntry, build_snapshot, scan_entry};
pub use watcher::{DirWatcher, FsEvent};
