use thiserror::Error;

/// Failure to interpret a stored grading payload.
///
/// Both variants are benign from the client's point of view: `Absent` means
/// the grader has not written anything yet, and `Malformed` is
/// indistinguishable from a payload still being written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeFailure {
    #[error("no result payload present")]
    Absent,
    #[error("result payload did not match the expected schema: {0}")]
    Malformed(String),
}

/// A failed repository operation, surfaced to the user as a retryable
/// error. Never fatal to the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkFailure {
    #[error("server responded with status {status}: {message}")]
    Http { status: u16, message: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("failed to obtain auth headers: {0}")]
    Auth(String),
    #[error("server rejected the request: {0}")]
    Rejected(String),
}

/// Credentials could not be produced for a request. The repository surfaces
/// this as [`NetworkFailure::Auth`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("auth failure: {0}")]
pub struct AuthFailure(pub String);

impl From<AuthFailure> for NetworkFailure {
    fn from(value: AuthFailure) -> Self {
        NetworkFailure::Auth(value.0)
    }
}

/// An invalid call sequence: a programming-contract violation, not a
/// runtime condition. Reported loudly in logs and treated as a no-op by
/// production callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("contract violation: {0}")]
pub struct LogicError(pub String);
