// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatrolError {
    /// The configuration file is absent and no bootstrap created it.
    #[error("no configuration file found at {0:?}")]
    ConfigMissing(PathBuf),

    /// The configuration file exists but is not a YAML sequence.
    #[error("could not parse {path:?}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// A file event subscription could not be opened.
    #[error("could not watch {path:?}: {source}")]
    Subscribe {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// Run-once mode did not settle every watch point within the deadline.
    #[error("run-once did not complete within {0:?}")]
    RunOnceTimeout(Duration),

    /// A `Patrol` definition is incomplete or inconsistent.
    #[error("invalid patrol definition: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PatrolError>;
