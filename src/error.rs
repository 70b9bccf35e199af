//! Error and control-flow signals raised while running a session.

use crate::collection::error::CollectionError;
use thiserror::Error;

/// Fatal misconfiguration; always propagated to the caller of the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct UsageError(pub String);

impl UsageError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Explicit request to end the run, optionally with a specific return code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{msg}")]
pub struct ExitRequest {
    pub msg: String,
    pub returncode: Option<i32>,
}

impl ExitRequest {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            returncode: None,
        }
    }

    pub fn with_returncode(msg: impl Into<String>, returncode: i32) -> Self {
        Self {
            msg: msg.into(),
            returncode: Some(returncode),
        }
    }
}

/// Everything that can end a session early.
///
/// `Failed` and `Interrupted` are the two cooperative signals raised by the
/// execution loop; the remaining variants are mapped to an exit status by
/// [`crate::wrap::wrap_session`].
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Usage(#[from] UsageError),

    /// The run should stop and be reported as failed.
    #[error("{0}")]
    Failed(String),

    /// The run was interrupted, e.g. by collection errors or `shouldstop`.
    #[error("{0}")]
    Interrupted(String),

    /// The user interrupted the process.
    #[error("keyboard interrupt")]
    KeyboardInterrupt,

    #[error(transparent)]
    Exit(#[from] ExitRequest),

    /// A plugin tried to terminate the process directly.
    #[error("process exit requested with status {0}")]
    SystemExit(i32),

    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

impl SessionError {
    /// Short name of the error kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::Usage(_) => "UsageError",
            SessionError::Failed(_) => "Failed",
            SessionError::Interrupted(_) => "Interrupted",
            SessionError::KeyboardInterrupt => "KeyboardInterrupt",
            SessionError::Exit(_) => "Exit",
            SessionError::SystemExit(_) => "SystemExit",
            SessionError::Collection(_) => "CollectionError",
            SessionError::Io(_) => "IoError",
            SessionError::Internal(_) => "InternalError",
        }
    }

    /// True for the signals that end the run as interrupted.
    pub fn is_interruption(&self) -> bool {
        matches!(
            self,
            SessionError::KeyboardInterrupt | SessionError::Interrupted(_) | SessionError::Exit(_)
        )
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
