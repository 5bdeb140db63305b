//! Error taxonomy.
//!
//! Recoverable failures (`LogError`, `BackendError`) are returned to the caller.
//! Wiring mistakes (`PreconditionViolation`) are raised with `panic!` through
//! [`violated`].

use thiserror::Error;

/// Errors returned while building a [`crate::LogService`].
#[derive(Debug, Error)]
pub enum LogError {
    /// The log id is empty or too long.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The backend client could not be created.
    #[error("logging backend unavailable")]
    BackendUnavailable(#[source] BackendError),
}

/// Errors reported by a logging backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Client creation failed.
    #[error("failed to connect to logging backend: {0}")]
    Connect(String),

    /// The client has already been closed.
    #[error("logging client is closed")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode log entry: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Call-site wiring bugs. Never returned; see [`violated`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionViolation {
    #[error("group log id must not be empty")]
    EmptyGroupLogId,

    #[error("group log id {0:?} must differ from the service log id")]
    SelfReferentialGroup(String),

    #[error("no logger bound to the request context; derive it from LogService::context")]
    MissingLogger,
}

/// Abort the current call path with a precondition violation.
#[track_caller]
pub fn violated(violation: PreconditionViolation) -> ! {
    panic!("precondition violated: {violation}")
}
