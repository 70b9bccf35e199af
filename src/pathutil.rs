//! Path helpers shared by collection and reporting.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Make `path` absolute against `base` and normalize `.` and `..` lexically.
pub fn absolutepath(base: &Path, path: impl AsRef<Path>) -> PathBuf {
    let joined = base.join(path.as_ref());
    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Longest common ancestor of two paths, if they share a root.
pub fn commonpath(a: &Path, b: &Path) -> Option<PathBuf> {
    let common: PathBuf = a
        .components()
        .zip(b.components())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x.as_os_str())
        .collect();
    if common.as_os_str().is_empty() {
        None
    } else {
        Some(common)
    }
}

/// Shortest readable path to `dest` as seen from `directory`.
///
/// Returns `"."` for the directory itself and falls back to `dest` unchanged
/// when the two paths share no common root.
pub fn bestrelpath(directory: &Path, dest: &Path) -> String {
    if directory == dest {
        return ".".into();
    }
    let Some(base) = commonpath(directory, dest) else {
        return dest.display().to_string();
    };
    let (Ok(reldirectory), Ok(reldest)) = (directory.strip_prefix(&base), dest.strip_prefix(&base))
    else {
        return dest.display().to_string();
    };

    let mut parts: PathBuf = reldirectory.components().map(|_| "..").collect();
    if !reldest.as_os_str().is_empty() {
        parts.push(reldest);
    }
    parts.display().to_string()
}

/// Memoized [`bestrelpath`] against a base fixed for the whole run.
#[derive(Debug, Clone)]
pub struct BestRelpathCache {
    path: PathBuf,
    cache: HashMap<PathBuf, String>,
}

impl BestRelpathCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: HashMap::new(),
        }
    }

    pub fn get(&mut self, path: &Path) -> String {
        let base = &self.path;
        self.cache
            .entry(path.to_path_buf())
            .or_insert_with(|| bestrelpath(base, path))
            .clone()
    }
}
