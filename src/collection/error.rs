//! Collection error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning a collector into its children.
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid local config {path}: {msg}")]
    InvalidLocalConfig { path: PathBuf, msg: String },

    /// Raised by a `collect_file` implementation.
    #[error("{0}")]
    Plugin(String),
}

/// Outcome of collecting one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionOutcome {
    Passed,
    Failed,
}

pub type CollectionResult<T> = Result<T, CollectionError>;
