// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::Value;

/// One entry of the watch file, exactly as written.
///
/// ```yaml
/// - source: docs/README.md
///   name: readme
///   template: page.html   # anything else is passed through
/// ```
///
/// Nothing here is checked yet; see [`WatchPoint::from_entry`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawWatchPoint {
    /// Path of the file (or directory) under surveillance.
    #[serde(default)]
    pub source: Option<String>,

    /// Human readable label.
    #[serde(default)]
    pub name: Option<String>,

    /// Every other key of the entry.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A validated watch point.
///
/// Immutable once built. A new set is built from scratch on every reload of
/// the watch file.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchPoint {
    source: String,
    path: PathBuf,
    name: String,
    raw: BTreeMap<String, Value>,
}

impl WatchPoint {
    pub(crate) fn new_unchecked(
        source: String,
        name: String,
        raw: BTreeMap<String, Value>,
    ) -> Self {
        let path = PathBuf::from(&source);
        Self {
            source,
            path,
            name,
            raw,
        }
    }

    /// Resolve a relative `source` against `base_dir`. Absolute sources are
    /// kept as they are.
    pub fn resolved_against(mut self, base_dir: &Path) -> Self {
        let declared = Path::new(&self.source);
        self.path = if declared.is_absolute() {
            declared.to_path_buf()
        } else {
            base_dir.join(declared)
        };
        self
    }

    /// `source` as declared in the watch file.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Resolved path of `source`.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The whole entry, including `source` and `name`.
    pub fn raw(&self) -> &BTreeMap<String, Value> {
        &self.raw
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    /// Convenience: a pass-through key as a string, if it is one.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.raw.get(key).and_then(Value::as_str)
    }
}
