//! Filesystem notifications for the source tree.
//!
//! Only two kinds of notification matter to the pairing logic: a file was
//! created, and a file that was open for writing was closed. Everything else
//! reported by `notify` is dropped in [`classify`].

use std::path::{Path, PathBuf};
use std::time::Instant;

use notify::event::{AccessKind, AccessMode, CreateKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info};

use crate::error::Result;

/// The notifications the collator reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    /// A file appeared.
    Created,
    /// A file opened for writing was closed.
    Completed,
}

/// One relevant notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    /// What happened.
    pub kind: FileEventKind,
    /// Absolute path of the file.
    pub path: PathBuf,
    /// When the notification was received.
    pub observed_at: Instant,
}

impl FileEvent {
    /// A creation of `path` observed now.
    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: FileEventKind::Created,
            path: path.into(),
            observed_at: Instant::now(),
        }
    }

    /// A completion of `path` observed now.
    pub fn completed(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: FileEventKind::Completed,
            path: path.into(),
            observed_at: Instant::now(),
        }
    }
}

/// Map a raw `notify` event onto zero or more [`FileEvent`]s.
///
/// Directory creations and every other event kind are ignored.
pub fn classify(event: &Event, observed_at: Instant) -> Vec<FileEvent> {
    let kind = match event.kind {
        EventKind::Create(CreateKind::File | CreateKind::Any) => FileEventKind::Created,
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => FileEventKind::Completed,
        _ => return Vec::new(),
    };

    event
        .paths
        .iter()
        .map(|path| FileEvent {
            kind,
            path: path.clone(),
            observed_at,
        })
        .collect()
}

/// Recursive watcher on the source directory.
///
/// Notifications stop when the watcher is dropped.
pub struct DirectoryWatcher {
    _watcher: RecommendedWatcher,
}

impl DirectoryWatcher {
    /// Start watching `root` recursively, sending classified events to `tx`.
    pub fn start(root: &Path, tx: UnboundedSender<FileEvent>) -> Result<Self> {
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for file_event in classify(&event, Instant::now()) {
                    debug!(kind = ?file_event.kind, path = %file_event.path.display(), "File event");
                    if tx.send(file_event).is_err() {
                        debug!("Event receiver dropped, discarding notification");
                        return;
                    }
                }
            }
            Err(e) => error!(error = %e, "Watch error"),
        })?;

        watcher.watch(root, RecursiveMode::Recursive)?;
        info!(path = %root.display(), "Watching source directory");

        Ok(Self { _watcher: watcher })
    }
}
