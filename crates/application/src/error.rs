//! Application error types

use rattle_domain::DomainError;
use thiserror::Error;

use crate::execute_request::ExecuteRequestError;
use crate::ports::HostError;
use crate::store::StoreError;
use crate::use_cases::{SaveRequestError, SendRequestError};

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// The host failed a file or directory operation.
    #[error("host error: {0}")]
    Host(#[from] HostError),

    /// The document could not be persisted.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// A request could not be executed.
    #[error("execution error: {0}")]
    Execute(#[from] ExecuteRequestError),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<SendRequestError> for ApplicationError {
    fn from(error: SendRequestError) -> Self {
        match error {
            SendRequestError::NotFound(id) => Self::NotFound(id),
            SendRequestError::Execute(e) => Self::Execute(e),
        }
    }
}

impl From<SaveRequestError> for ApplicationError {
    fn from(error: SaveRequestError) -> Self {
        match error {
            SaveRequestError::NotFound(id) => Self::NotFound(id),
            SaveRequestError::Store(e) => Self::Store(e),
        }
    }
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
