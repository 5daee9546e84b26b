// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RemoveKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::errors::{PatrolError, Result};
use crate::types::{FileEvent, FileEventKind};
use crate::watch::path_utils::{canonical_lossy, same_entity};
use crate::watch::source::{FileEventSource, Subscription};

/// `FileEventSource` backed by the platform watcher from `notify`.
///
/// - A file is watched through its parent directory (non-recursive) and
///   events are filtered down to that file. Editors that save by writing a
///   temporary file and renaming it over the original keep being observed.
/// - A directory is watched recursively; every entry below it reports.
#[derive(Debug, Clone, Default)]
pub struct NotifyEventSource {
    config: Config,
}

impl NotifyEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom `notify` configuration (e.g. a polling interval).
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }
}

/// Which notify paths belong to a subscription.
#[derive(Debug, Clone)]
enum Scope {
    File(PathBuf),
    Tree(PathBuf),
}

impl Scope {
    fn contains(&self, path: &Path) -> bool {
        match self {
            Scope::File(target) => same_entity(target, path),
            Scope::Tree(root) => {
                path.starts_with(root)
                    || canonical_lossy(path).is_some_and(|p| p.starts_with(root))
            }
        }
    }
}

impl FileEventSource for NotifyEventSource {
    fn subscribe(&self, path: &Path) -> Result<Subscription> {
        let target = canonical_lossy(path).unwrap_or_else(|| path.to_path_buf());
        let is_dir = target.is_dir();

        let (scope, watch_root, mode) = if is_dir {
            (
                Scope::Tree(target.clone()),
                target.clone(),
                RecursiveMode::Recursive,
            )
        } else {
            let parent = target
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            (
                Scope::File(target.clone()),
                parent,
                RecursiveMode::NonRecursive,
            )
        };

        let (event_tx, event_rx) = mpsc::unbounded_channel::<FileEvent>();

        // Queued before the watcher exists, so it is always first.
        let _ = event_tx.send(FileEvent::new(FileEventKind::Initialized, &target, is_dir));

        // Closure called synchronously by notify whenever an event arrives.
        let mut watcher = RecommendedWatcher::new(
            {
                let event_tx = event_tx.clone();
                let scope = scope.clone();
                move |res: notify::Result<Event>| match res {
                    Ok(event) => forward_event(&scope, event, &event_tx),
                    Err(err) => warn!("file watch error: {err}"),
                }
            },
            self.config,
        )
        .map_err(|source| PatrolError::Subscribe {
            path: path.to_path_buf(),
            source,
        })?;

        watcher
            .watch(&watch_root, mode)
            .map_err(|source| PatrolError::Subscribe {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(path = ?target, root = ?watch_root, "file watcher started");

        Ok(Subscription::new(target, event_rx, watcher))
    }
}

/// Translate one notify event into zero or more `FileEvent`s.
fn forward_event(scope: &Scope, event: Event, tx: &mpsc::UnboundedSender<FileEvent>) {
    trace!(?event, "received notify event");

    let renamed_both = matches!(event.kind, EventKind::Modify(ModifyKind::Name(RenameMode::Both)));

    for (position, path) in event.paths.iter().enumerate() {
        if !scope.contains(path) {
            continue;
        }

        let kind = match event.kind {
            EventKind::Create(_) => FileEventKind::Created,
            EventKind::Remove(_) => FileEventKind::Deleted,
            // `Both` carries [from, to].
            EventKind::Modify(ModifyKind::Name(_)) if renamed_both => {
                if position == 0 {
                    FileEventKind::Deleted
                } else {
                    FileEventKind::Created
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => FileEventKind::Deleted,
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => FileEventKind::Created,
            EventKind::Modify(ModifyKind::Name(_)) => {
                if path.exists() {
                    FileEventKind::Created
                } else {
                    FileEventKind::Deleted
                }
            }
            EventKind::Modify(ModifyKind::Metadata(_)) => continue,
            EventKind::Modify(_) => FileEventKind::Modified,
            EventKind::Access(_) | EventKind::Any | EventKind::Other => continue,
        };

        let is_dir = match event.kind {
            EventKind::Remove(RemoveKind::Folder) => true,
            _ if kind == FileEventKind::Deleted => false,
            _ => path.is_dir(),
        };

        // Receiver gone means the subscription was closed; nothing to do.
        let _ = tx.send(FileEvent::new(kind, path.clone(), is_dir));
    }
}
