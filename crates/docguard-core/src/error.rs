//! Shared error type across docguard crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Rejected by a rule.
    PermissionDenied,
    /// Structurally invalid request, independent of the caller.
    MalformedRequest,
    /// Target document does not exist.
    NotFound,
    /// Target document already exists.
    AlreadyExists,
    /// Harness scenario exceeded its time bound.
    HarnessTimeout,
    /// Harness assertion did not hold.
    ExpectationFailed,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in JSON responses and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::MalformedRequest => "MALFORMED_REQUEST",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::AlreadyExists => "ALREADY_EXISTS",
            ErrorCode::HarnessTimeout => "HARNESS_TIMEOUT",
            ErrorCode::ExpectationFailed => "EXPECTATION_FAILED",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, DocGuardError>;

/// Unified error type used by core and emulator.
#[derive(Debug, Error)]
pub enum DocGuardError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("scenario `{scenario}` timed out after {after_ms}ms")]
    HarnessTimeout { scenario: String, after_ms: u64 },
    #[error("expectation failed: {0}")]
    ExpectationFailed(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl DocGuardError {
    /// Map internal error to a stable client-facing code.
    pub fn code(&self) -> ErrorCode {
        match self {
            DocGuardError::PermissionDenied(_) => ErrorCode::PermissionDenied,
            DocGuardError::MalformedRequest(_) => ErrorCode::MalformedRequest,
            DocGuardError::NotFound(_) => ErrorCode::NotFound,
            DocGuardError::AlreadyExists(_) => ErrorCode::AlreadyExists,
            DocGuardError::HarnessTimeout { .. } => ErrorCode::HarnessTimeout,
            DocGuardError::ExpectationFailed(_) => ErrorCode::ExpectationFailed,
            DocGuardError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// True only for a rule rejection. Request errors never count as denials.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, DocGuardError::PermissionDenied(_))
    }
}
