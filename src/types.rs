use std::fmt;
use std::path::PathBuf;

/// Kind of change reported by a [`crate::watch::FileEventSource`].
///
/// - `Initialized`: synthetic event emitted once when a subscription opens.
/// - `Created` / `Modified` / `Deleted`: real filesystem changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileEventKind {
    Initialized,
    Created,
    Modified,
    Deleted,
}

impl FileEventKind {
    /// Whether an event of this kind on the configuration file starts a new
    /// generation. Deleting the configuration file keeps the current one.
    pub fn triggers_rebuild(self) -> bool {
        !matches!(self, FileEventKind::Deleted)
    }
}

impl fmt::Display for FileEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileEventKind::Initialized => "initialized",
            FileEventKind::Created => "created",
            FileEventKind::Modified => "modified",
            FileEventKind::Deleted => "deleted",
        };
        f.write_str(s)
    }
}

/// A single change notification for a subscribed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub kind: FileEventKind,
    /// The entity that changed (the subscribed path, or an entry below it
    /// when a directory is watched).
    pub path: PathBuf,
    /// Whether the changed entity is a directory.
    pub is_dir: bool,
}

impl FileEvent {
    pub fn new(kind: FileEventKind, path: impl Into<PathBuf>, is_dir: bool) -> Self {
        Self {
            kind,
            path: path.into(),
            is_dir,
        }
    }

    /// Directory `Modified` events are transitional noise (entry lists
    /// changing); only file content changes are worth an inspection.
    pub fn is_significant(&self) -> bool {
        match self.kind {
            FileEventKind::Initialized | FileEventKind::Created | FileEventKind::Deleted => true,
            FileEventKind::Modified => !self.is_dir,
        }
    }
}
