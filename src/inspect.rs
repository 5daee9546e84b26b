// src/inspect.rs

//! Caller-supplied callbacks.
//!
//! The supervisor never knows what an inspection does. It calls an
//! [`Inspection`] whenever a watch point changes, and a [`Bootstrap`] once
//! at startup if the watch file is missing.
//!
//! Both are implemented for plain closures, so most callers never name
//! these traits:
//!
//! ```no_run
//! use patrol::{Patrol, WatchPoint};
//!
//! let patrol = Patrol::builder("lint")
//!     .help("Lint files when they change")
//!     .on_inspection(|wp: &WatchPoint, dry_run: bool| {
//!         println!("{} changed (dry run: {dry_run})", wp.name());
//!         Ok(())
//!     })
//!     .build();
//! ```

use std::path::Path;

use crate::config::WatchPoint;

/// Work to perform when a watch point changes.
///
/// Called on the blocking thread pool. It may be called concurrently for
/// different watch points, never concurrently for the same one. Errors are
/// logged by the caller and do not stop further inspections.
pub trait Inspection: Send + Sync + 'static {
    fn inspect(&self, watch_point: &WatchPoint, dry_run: bool) -> anyhow::Result<()>;
}

impl<F> Inspection for F
where
    F: Fn(&WatchPoint, bool) -> anyhow::Result<()> + Send + Sync + 'static,
{
    fn inspect(&self, watch_point: &WatchPoint, dry_run: bool) -> anyhow::Result<()> {
        self(watch_point, dry_run)
    }
}

/// Creates the watch file when it does not exist yet.
///
/// Returns true if the file is now in place.
pub trait Bootstrap: Send + Sync + 'static {
    fn bootstrap(&self, watch_file: &Path) -> bool;
}

impl<F> Bootstrap for F
where
    F: Fn(&Path) -> bool + Send + Sync + 'static,
{
    fn bootstrap(&self, watch_file: &Path) -> bool {
        self(watch_file)
    }
}
