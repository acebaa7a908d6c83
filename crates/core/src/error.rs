//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Failures a stock record can report without touching storage.
///
/// Storage and index failures have their own types in `bookstock-infra`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A field outside its allowed range, such as a too-short name.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A string that does not parse as a stock id.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Stale version on an optimistic write.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}
