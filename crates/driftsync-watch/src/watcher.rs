//! Filesystem watcher integration.
//!
//! A `notify` backend watches the root recursively and translates raw
//! notifications into typed events on a channel. Filtering happens at
//! this boundary: directory events, hidden names, editor backups
//! (trailing `~`) and the index file never reach the engine.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError, channel};
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error};

use crate::error::WatchError;
use crate::snapshot::is_excluded_name;

/// A filtered filesystem change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsEvent {
    /// File appeared
    Created(PathBuf),
    /// File contents or metadata changed
    Modified(PathBuf),
    /// File disappeared
    Deleted(PathBuf),
}

impl FsEvent {
    /// Path the event refers to
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Created(p) | Self::Modified(p) | Self::Deleted(p) => p,
        }
    }
}

/// Recursive directory watcher delivering typed events
pub struct DirWatcher {
    // Kept alive for the lifetime of the subscription
    _watcher: RecommendedWatcher,
    events: Receiver<FsEvent>,
}

impl DirWatcher {
    /// Start watching `root` recursively.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification backend cannot be created or
    /// the root cannot be watched.
    pub fn watch(root: &Path) -> Result<Self, WatchError> {
        let (tx, events) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| match result {
                Ok(event) => {
                    for fs_event in translate(&event) {
                        // Receiver gone means the engine stopped; nothing
                        // left to notify.
                        let _ = tx.send(fs_event);
                    }
                }
                Err(err) => error!(%err, "watch backend error"),
            },
            notify::Config::default(),
        )?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        debug!(root = %root.display(), "watching");

        Ok(Self {
            _watcher: watcher,
            events,
        })
    }

    /// Wait up to `timeout` for the next event
    #[must_use]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<FsEvent> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// Map a raw notification to the typed events it implies
fn translate(event: &Event) -> Vec<FsEvent> {
    let make: fn(PathBuf) -> FsEvent = match event.kind {
        EventKind::Create(_) => FsEvent::Created,
        EventKind::Modify(_) => FsEvent::Modified,
        EventKind::Remove(_) => FsEvent::Deleted,
        _ => return Vec::new(),
    };

    event
        .paths
        .iter()
        .filter(|path| !should_ignore(path))
        .map(|path| make(path.clone()))
        .collect()
}

/// Events the engine must never see
fn should_ignore(path: &Path) -> bool {
    if path.is_dir() {
        return true;
    }
    let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return true;
    };
    is_excluded_name(&name) || name.ends_with('~')
}
