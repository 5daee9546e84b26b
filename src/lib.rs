// src/lib.rs

//! patrol: run a routine whenever one of the files listed in a YAML watch
//! file changes, and rebuild the whole watcher set whenever the watch file
//! itself changes.
//!
//! This wires together:
//! - watch file loading / validation ([`config`])
//! - the file event source seam ([`watch`])
//! - the supervisor, its generations and the run-once barrier ([`engine`])
//! - the caller's callbacks ([`inspect`]) and the [`Patrol`] definition

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod inspect;
pub mod logging;
pub mod patrol;
pub mod types;
pub mod watch;

pub use crate::cli::CliArgs;
pub use crate::config::{ValidationError, WatchPoint};
pub use crate::engine::{Outcome, Supervisor, SupervisorOptions};
pub use crate::errors::{PatrolError, Result};
pub use crate::inspect::{Bootstrap, Inspection};
pub use crate::patrol::{Patrol, PatrolBuilder};
pub use crate::types::{FileEvent, FileEventKind};
