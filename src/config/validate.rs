// src/config/validate.rs

use serde_yaml::Value;
use thiserror::Error;

use crate::config::model::{RawWatchPoint, WatchPoint};

/// Why a single watch file entry was rejected.
///
/// `index` is the zero-based position of the entry in the sequence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("entry #{index} is not a mapping")]
    NotAMapping { index: usize },

    #[error("entry #{index}: `{field}` not defined")]
    MissingField { index: usize, field: &'static str },

    #[error("entry #{index}: `{field}` is blank")]
    BlankField { index: usize, field: &'static str },

    #[error("entry #{index}: {message}")]
    Malformed { index: usize, message: String },
}

impl ValidationError {
    pub fn index(&self) -> usize {
        match self {
            ValidationError::NotAMapping { index }
            | ValidationError::MissingField { index, .. }
            | ValidationError::BlankField { index, .. }
            | ValidationError::Malformed { index, .. } => *index,
        }
    }
}

impl WatchPoint {
    /// Validate one parsed entry of the watch file.
    ///
    /// The returned watch point is not resolved yet; the loader resolves it
    /// against the base directory.
    pub fn from_entry(index: usize, entry: Value) -> Result<Self, ValidationError> {
        if !entry.is_mapping() {
            return Err(ValidationError::NotAMapping { index });
        }

        let raw: RawWatchPoint =
            serde_yaml::from_value(entry).map_err(|e| ValidationError::Malformed {
                index,
                message: e.to_string(),
            })?;

        let source = required_field(index, "source", raw.source)?;
        let name = required_field(index, "name", raw.name)?;

        let mut all = raw.extra;
        all.insert("source".to_string(), Value::String(source.clone()));
        all.insert("name".to_string(), Value::String(name.clone()));

        Ok(WatchPoint::new_unchecked(source, name, all))
    }
}

fn required_field(
    index: usize,
    field: &'static str,
    value: Option<String>,
) -> Result<String, ValidationError> {
    match value {
        None => Err(ValidationError::MissingField { index, field }),
        Some(v) if v.trim().is_empty() => Err(ValidationError::BlankField { index, field }),
        Some(v) => Ok(v),
    }
}
