// src/watch/manual.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use crate::errors::Result;
use crate::types::{FileEvent, FileEventKind};
use crate::watch::source::{FileEventSource, Subscription};

/// A subscription lifecycle step recorded by [`ManualEventSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOp {
    Subscribed(PathBuf),
    Closed(PathBuf),
}

#[derive(Debug, Default)]
struct ManualState {
    subscribers: HashMap<PathBuf, Vec<mpsc::UnboundedSender<FileEvent>>>,
    journal: Vec<SourceOp>,
}

/// In-memory `FileEventSource` whose events are pushed by hand.
///
/// Every subscription receives `Initialized` immediately. Subscriptions and
/// closures are recorded in order so callers can check lifecycle ordering.
#[derive(Debug, Clone, Default)]
pub struct ManualEventSource {
    state: Arc<Mutex<ManualState>>,
}

impl ManualEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Deliver `kind` for `path` to every open subscription of `path`.
    /// `is_dir` is read from the real filesystem.
    ///
    /// Returns how many subscriptions received it.
    pub fn emit(&self, path: impl AsRef<Path>, kind: FileEventKind) -> usize {
        let path = path.as_ref();
        self.emit_event(path, FileEvent::new(kind, path, path.is_dir()))
    }

    /// Deliver an arbitrary event to every open subscription of `subscribed`.
    pub fn emit_event(&self, subscribed: impl AsRef<Path>, event: FileEvent) -> usize {
        let mut state = self.lock();
        let Some(senders) = state.subscribers.get_mut(subscribed.as_ref()) else {
            return 0;
        };
        senders.retain(|tx| !tx.is_closed());
        senders
            .iter()
            .filter(|tx| tx.send(event.clone()).is_ok())
            .count()
    }

    /// Number of open subscriptions for `path`.
    pub fn active(&self, path: impl AsRef<Path>) -> usize {
        self.lock()
            .subscribers
            .get(path.as_ref())
            .map(|senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    /// Number of open subscriptions across all paths.
    pub fn total_active(&self) -> usize {
        self.lock()
            .subscribers
            .values()
            .flatten()
            .filter(|tx| !tx.is_closed())
            .count()
    }

    pub fn journal(&self) -> Vec<SourceOp> {
        self.lock().journal.clone()
    }

    /// End every subscription as if the backend went away.
    pub fn shutdown(&self) {
        self.lock().subscribers.clear();
    }
}

/// Records `SourceOp::Closed` when its subscription is closed or dropped.
struct CloseRecorder {
    path: PathBuf,
    state: Arc<Mutex<ManualState>>,
}

impl Drop for CloseRecorder {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.journal.push(SourceOp::Closed(self.path.clone()));
    }
}

impl FileEventSource for ManualEventSource {
    fn subscribe(&self, path: &Path) -> Result<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(FileEvent::new(FileEventKind::Initialized, path, path.is_dir()));

        {
            let mut state = self.lock();
            state.journal.push(SourceOp::Subscribed(path.to_path_buf()));
            state
                .subscribers
                .entry(path.to_path_buf())
                .or_default()
                .push(tx);
        }

        let recorder = CloseRecorder {
            path: path.to_path_buf(),
            state: Arc::clone(&self.state),
        };
        Ok(Subscription::new(path, rx, recorder))
    }
}
