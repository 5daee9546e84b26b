// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::{Path, PathBuf};

/// Return true if `candidate` (a path reported by the OS) names the same
/// entity as `target`.
///
/// - First we try a direct comparison.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and compare again. Paths that no longer
///   exist are canonicalized through their parent directory.
pub fn same_entity(target: &Path, candidate: &Path) -> bool {
    if target == candidate {
        return true;
    }

    // Notably macOS reports `/private/var/...` for `/var/...`.
    match (canonical_lossy(target), canonical_lossy(candidate)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Canonicalize `path`, falling back to canonicalizing its parent for paths
/// that were just deleted.
pub fn canonical_lossy(path: &Path) -> Option<PathBuf> {
    if let Ok(canon) = path.canonicalize() {
        return Some(canon);
    }
    let parent = path.parent()?;
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    let parent = parent.canonicalize().ok()?;
    Some(parent.join(path.file_name()?))
}
