// src/config/mod.rs

//! Watch file loading and validation for patrol.
//!
//! Responsibilities:
//! - Define the YAML-backed data model (`model.rs`).
//! - Load the watch file from disk (`loader.rs`).
//! - Validate each entry into a [`WatchPoint`] (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_watch_points, parse_watch_points, LoadedEntries};
pub use model::{RawWatchPoint, WatchPoint};
pub use validate::ValidationError;
