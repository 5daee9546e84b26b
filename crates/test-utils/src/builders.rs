#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Builder for watch file contents to simplify test setup.
#[derive(Debug, Default, Clone)]
pub struct WatchFileBuilder {
    entries: Vec<String>,
}

impl WatchFileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `- source: <source>\n  name: <name>`
    pub fn watch(self, source: &str, name: &str) -> Self {
        self.watch_with(source, name, &[])
    }

    /// A watch point with extra pass-through keys.
    pub fn watch_with(mut self, source: &str, name: &str, extra: &[(&str, &str)]) -> Self {
        let mut entry = format!("- source: \"{source}\"\n  name: \"{name}\"\n");
        for (key, value) in extra {
            entry.push_str(&format!("  {key}: \"{value}\"\n"));
        }
        self.entries.push(entry);
        self
    }

    /// A raw YAML sequence item, e.g. `"- name: no source"`.
    pub fn raw(mut self, item: &str) -> Self {
        let mut item = item.to_string();
        if !item.ends_with('\n') {
            item.push('\n');
        }
        self.entries.push(item);
        self
    }

    pub fn build(&self) -> String {
        if self.entries.is_empty() {
            return "[]\n".to_string();
        }
        self.entries.concat()
    }
}

/// A temporary working directory holding a watch file and watched files.
pub struct TestWorkspace {
    dir: TempDir,
    watch_file: String,
}

impl TestWorkspace {
    /// Empty workspace whose watch file is called `patrol.yaml`.
    pub fn new() -> Self {
        Self::with_watch_file("patrol.yaml")
    }

    pub fn with_watch_file(name: &str) -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
            watch_file: name.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn watch_file(&self) -> PathBuf {
        self.path(&self.watch_file)
    }

    /// Create (or overwrite) a file relative to the workspace root.
    pub fn touch(&self, rel: &str) -> PathBuf {
        self.write(rel, "")
    }

    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        fs::create_dir_all(&path).expect("create dir");
        path
    }

    pub fn write_watch_file(&self, contents: impl AsRef<str>) -> PathBuf {
        let path = self.watch_file();
        fs::write(&path, contents.as_ref()).expect("write watch file");
        path
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}
