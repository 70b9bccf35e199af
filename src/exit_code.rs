//! Process exit status for a session run.

use std::fmt;

/// Exit codes with a fixed meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExitCode {
    /// No failures, normal completion.
    Ok = 0,
    /// At least one test failed.
    TestsFailed = 1,
    /// Collection errors halted the run, or an interruption signal fired.
    Interrupted = 2,
    /// Unexpected error while running the session.
    InternalError = 3,
    /// Invalid configuration or command line usage.
    UsageError = 4,
}

impl ExitCode {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ExitCode::Ok),
            1 => Some(ExitCode::TestsFailed),
            2 => Some(ExitCode::Interrupted),
            3 => Some(ExitCode::InternalError),
            4 => Some(ExitCode::UsageError),
            _ => None,
        }
    }
}

/// Final status of a run: one of the known codes, or an explicit code
/// requested by a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitStatus {
    Known(ExitCode),
    Other(i32),
}

impl ExitStatus {
    pub fn from_code(code: i32) -> Self {
        match ExitCode::from_code(code) {
            Some(known) => ExitStatus::Known(known),
            None => ExitStatus::Other(code),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Known(known) => known as i32,
            ExitStatus::Other(code) => code,
        }
    }
}

impl Default for ExitStatus {
    fn default() -> Self {
        ExitStatus::Known(ExitCode::Ok)
    }
}

impl From<ExitCode> for ExitStatus {
    fn from(code: ExitCode) -> Self {
        ExitStatus::Known(code)
    }
}

impl PartialEq<ExitCode> for ExitStatus {
    fn eq(&self, other: &ExitCode) -> bool {
        *self == ExitStatus::Known(*other)
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::Known(known) => write!(f, "{known:?} ({})", *known as i32),
            ExitStatus::Other(code) => write!(f, "{code}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_map_back() {
        assert_eq!(ExitStatus::from_code(0), ExitCode::Ok);
        assert_eq!(ExitStatus::from_code(4), ExitCode::UsageError);
        assert_eq!(ExitStatus::from_code(2).code(), 2);
    }

    #[test]
    fn test_unknown_code_passes_through() {
        let status = ExitStatus::from_code(42);
        assert_eq!(status, ExitStatus::Other(42));
        assert_eq!(status.code(), 42);
    }

    #[test]
    fn test_default_is_ok() {
        assert_eq!(ExitStatus::default(), ExitCode::Ok);
    }
}
