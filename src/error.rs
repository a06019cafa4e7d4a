//! Structured error handling and exit codes.

use serde::Serialize;

use crate::cache::ResolveError;

/// Exit codes for the trackcache CLI.
///
/// - 0: Success (results found / track resolved)
/// - 1: General error (unexpected failure, bad configuration)
/// - 2: Not found (no search hits, or no file with the exact title)
/// - 3: Partial success (some entries were skipped; results or a refused fetch)
/// - 4: Retrieval failed (the fetch tool could not produce the track)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the query was answered.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// Not found: the query completed with no result.
    NotFound = 2,
    /// Partial success: answered, but the scan skipped unreadable entries.
    PartialSuccess = 3,
    /// Retrieval failed: the external fetch did not produce a track.
    RetrievalFailed = 4,
    /// Interrupted: the run was interrupted by the user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "TC000",
            Self::GeneralError => "TC001",
            Self::NotFound => "TC002",
            Self::PartialSuccess => "TC003",
            Self::RetrievalFailed => "TC004",
            Self::Interrupted => "TC130",
        }
    }

    /// Pick the exit code for a failed run.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<ResolveError>() {
            Some(ResolveError::Retrieval(crate::retrieval::RetrievalError::Cancelled { .. })) => {
                Self::Interrupted
            }
            Some(ResolveError::Retrieval(_)) => Self::RetrievalFailed,
            Some(ResolveError::Interrupted) => Self::Interrupted,
            Some(ResolveError::IncompleteScan { .. }) => Self::PartialSuccess,
            _ => Self::GeneralError,
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "TC001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
