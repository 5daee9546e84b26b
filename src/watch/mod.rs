// src/watch/mod.rs

//! File watching.
//!
//! This module is responsible for:
//! - The [`FileEventSource`] seam the supervisor subscribes through.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - An in-memory source for driving the supervisor by hand.
//!
//! It does **not** know about watch points or generations; it only turns a
//! path into a stream of [`crate::types::FileEvent`]s.

pub mod manual;
pub mod path_utils;
pub mod source;
pub mod watcher;

pub use manual::{ManualEventSource, SourceOp};
pub use source::{FileEventSource, Subscription};
pub use watcher::NotifyEventSource;
