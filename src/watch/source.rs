// src/watch/source.rs

//! Pluggable file event source abstraction.
//!
//! The supervisor talks to a `FileEventSource` instead of `notify` directly.
//! Production code uses [`super::NotifyEventSource`]; tests use
//! [`super::ManualEventSource`] to script events deterministically.

use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

use crate::errors::Result;
use crate::types::FileEvent;

/// Something that can turn a path into a stream of [`FileEvent`]s.
///
/// The first event of every subscription must be
/// [`crate::types::FileEventKind::Initialized`].
pub trait FileEventSource: Send + Sync + 'static {
    fn subscribe(&self, path: &Path) -> Result<Subscription>;
}

/// One open subscription (a "watcher handle").
///
/// Closing it, or dropping it, stops delivery and releases whatever the
/// backend needs to keep the subscription alive.
pub struct Subscription {
    path: PathBuf,
    events: mpsc::UnboundedReceiver<FileEvent>,
    guard: Option<Box<dyn Any + Send>>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("path", &self.path)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Subscription {
    /// Wrap a receiver of events. `guard` is dropped on close.
    pub fn new(
        path: impl Into<PathBuf>,
        events: mpsc::UnboundedReceiver<FileEvent>,
        guard: impl Any + Send,
    ) -> Self {
        Self {
            path: path.into(),
            events,
            guard: Some(Box::new(guard)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for the next event. Returns `None` once closed or once the
    /// backend goes away.
    pub async fn next(&mut self) -> Option<FileEvent> {
        if self.is_closed() {
            return None;
        }
        self.events.recv().await
    }

    /// Stop delivery. Idempotent.
    pub fn close(&mut self) {
        if self.guard.take().is_some() {
            self.events.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.guard.is_none()
    }
}
