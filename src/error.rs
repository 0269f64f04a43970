//! Error types for simspace.
//!
//! Errors carry a code plus a message so callers can distinguish
//! configuration problems (fix inputs) from computation failures
//! (retry or report) from user cancellation.

use std::fmt;
use thiserror::Error;

/// Error classification for simspace operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Run was cancelled cooperatively.
    Cancelled,
    /// Invalid argument provided (configuration problem).
    InvalidArgument,
    /// Requested resource was not found (e.g. unknown metric name).
    NotFound,
    /// A resource limit was hit (e.g. distance-matrix row cap).
    ResourceExhausted,
    /// Computation failed internally.
    Internal,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Cancelled => write!(f, "CANCELLED"),
            ErrorCode::InvalidArgument => write!(f, "INVALID_ARGUMENT"),
            ErrorCode::NotFound => write!(f, "NOT_FOUND"),
            ErrorCode::ResourceExhausted => write!(f, "RESOURCE_EXHAUSTED"),
            ErrorCode::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Main error type for simspace operations.
#[derive(Error, Debug, Clone)]
pub struct SimError {
    code: ErrorCode,
    message: String,
}

impl SimError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check whether this error represents a cooperative cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.code == ErrorCode::Cancelled
    }

    // Convenience constructors

    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, msg)
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, msg)
    }

    /// Create a resource exhausted error.
    pub fn resource_exhausted(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceExhausted, msg)
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }

    /// Create a cancellation marker.
    pub fn cancelled() -> Self {
        Self::new(ErrorCode::Cancelled, "operation cancelled")
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Result type alias for simspace operations.
pub type Result<T> = std::result::Result<T, SimError>;
