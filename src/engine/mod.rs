// src/engine/mod.rs

//! Supervision engine for patrol.
//!
//! This module ties together:
//! - the reactive loop over watch file events ([`supervisor`])
//! - the live watcher set of one configuration generation ([`generation`])
//! - one dispatch task per watch point ([`dispatch`])
//! - the `--run-once` completion barrier ([`barrier`])
//!
//! A generation is always fully retired (tasks cancelled *and* joined)
//! before the next one opens a single subscription.

use std::path::PathBuf;
use std::time::Duration;

pub mod barrier;
pub(crate) mod dispatch;
pub(crate) mod generation;
pub mod supervisor;

pub use barrier::{BarrierEntry, CompletionBarrier};
pub use supervisor::Supervisor;

/// Runtime options for the supervisor.
#[derive(Debug, Clone, Copy, Default)]
pub struct SupervisorOptions {
    /// Inspect every watch point once, then stop.
    pub run_once: bool,
    /// Passed through to every inspection.
    pub dry_run: bool,
    /// Full error chains in failure logs.
    pub debug: bool,
    /// Fail `run_once` if a generation is not fully inspected in time.
    pub run_once_timeout: Option<Duration>,
}

/// How the supervisor stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Run-once finished: every watch point was inspected.
    Completed,
    /// Stopped from outside (e.g. Ctrl-C) or the watch file stream ended.
    Shutdown,
}

/// Observable summary of the live generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationStatus {
    /// Zero before the first generation is built.
    pub generation: u64,
    pub watch_points: Vec<WatchPointIdentity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchPointIdentity {
    pub name: String,
    pub path: PathBuf,
}

/// Messages from a generation's background tasks to the supervisor loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GenerationSignal {
    Completed { generation: u64 },
    DeadlineElapsed { generation: u64 },
}

impl GenerationSignal {
    pub(crate) fn generation(self) -> u64 {
        match self {
            GenerationSignal::Completed { generation }
            | GenerationSignal::DeadlineElapsed { generation } => generation,
        }
    }
}
