//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The provided URL is invalid or malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// Text that was expected to hold JSON does not parse.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// The persisted document could not be read or written.
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
