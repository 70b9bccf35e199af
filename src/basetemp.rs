//! Validation of the `--basetemp` option.
//!
//! The base temporary directory is wiped at the start of a run, so it must
//! never point at the working directory or one of its parents.

use crate::pathutil::absolutepath;
use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("basetemp must not be empty, the current working directory or any parent directory of it")]
pub struct BasetempError;

/// Validate `path` against the current working directory.
///
/// Usable directly as a clap `value_parser`.
pub fn validate_basetemp(path: &str) -> Result<String, BasetempError> {
    let cwd = env::current_dir().map_err(|_| BasetempError)?;
    validate_basetemp_in(path, &cwd)
}

/// Validate `path` as if `cwd` were the working directory.
pub fn validate_basetemp_in(path: &str, cwd: &Path) -> Result<String, BasetempError> {
    if path.is_empty() {
        return Err(BasetempError);
    }

    // The runner wipes the lexically normalized path.
    if is_ancestor(cwd, &absolutepath(cwd, path)) {
        return Err(BasetempError);
    }

    // A symlink can alias the cwd under a different spelling.
    if is_ancestor(&resolve(cwd), &resolve(&cwd.join(path))) {
        return Err(BasetempError);
    }

    Ok(path.to_string())
}

fn is_ancestor(base: &Path, query: &Path) -> bool {
    base == query || base.starts_with(query)
}

/// Resolve symlinks component by component, like `realpath`.
///
/// `..` pops the already resolved prefix; components that do not exist are
/// kept as written.
fn resolve(path: &Path) -> PathBuf {
    let mut resolved = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => {
                resolved.push(other.as_os_str());
                if let Ok(real) = fs::canonicalize(&resolved) {
                    resolved = real;
                }
            }
        }
    }
    resolved
}
