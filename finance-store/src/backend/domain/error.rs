use std::time::Duration;
use thiserror::Error;

/// Failure of a finance store operation
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// A remote operation was attempted without a resolved user id
    #[error("User not authenticated")]
    NotAuthenticated,

    /// The backend rejected or failed the request; carries its message
    #[error("{0}")]
    Backend(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid input: {0}")]
    Validation(String),

    /// The startup session check did not answer in time
    #[error("Session check timed out after {}ms", .0.as_millis())]
    SessionTimeout(Duration),
}

impl StoreError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound { kind, id: id.into() }
    }
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
