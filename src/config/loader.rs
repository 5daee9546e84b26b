// src/config/loader.rs

use std::fs;
use std::path::Path;

use serde_yaml::Value;

use crate::config::model::WatchPoint;
use crate::config::validate::ValidationError;
use crate::errors::{PatrolError, Result};

/// Outcome of loading a watch file: one result per entry, in file order.
pub type LoadedEntries = Vec<std::result::Result<WatchPoint, ValidationError>>;

/// Load the watch file at `path`.
///
/// - Fails as a whole (`PatrolError::ConfigParse`) if the contents are not a
///   YAML sequence.
/// - Otherwise every entry is validated on its own; a bad entry never hides
///   the good ones.
/// - Relative `source` paths are resolved against `base_dir`.
pub fn load_watch_points(path: impl AsRef<Path>, base_dir: &Path) -> Result<LoadedEntries> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    parse_watch_points(&contents, base_dir).map_err(|message| PatrolError::ConfigParse {
        path: path.to_path_buf(),
        message,
    })
}

/// Parse watch file contents. The error is a human readable reason.
///
/// An empty document (no content, only comments, or `~`) has no entries.
pub fn parse_watch_points(
    contents: &str,
    base_dir: &Path,
) -> std::result::Result<LoadedEntries, String> {
    let blank = contents
        .lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#'));
    if blank {
        return Ok(Vec::new());
    }

    let document: Value = serde_yaml::from_str(contents).map_err(|e| e.to_string())?;

    let entries = match document {
        Value::Null => return Ok(Vec::new()),
        Value::Sequence(entries) => entries,
        other => {
            return Err(format!(
                "expected a sequence of watch points, found {}",
                describe(&other)
            ));
        }
    };

    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            WatchPoint::from_entry(index, entry).map(|wp| wp.resolved_against(base_dir))
        })
        .collect())
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "nothing",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
