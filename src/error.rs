//! # Structured Error Handling
//!
//! Every external action performed by a lifecycle worker returns a
//! [`ServiceError`] carrying a class: client errors are intrinsically invalid
//! requests and are never retried, server errors are transient infrastructure
//! failures and are retried within a bounded window, and anything that cannot
//! be classified is treated conservatively as non-retryable. The retry policy
//! built on top of this classification lives in [`crate::workers::retry`].

use thiserror::Error;

/// Classification of an error's cause, used by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request is intrinsically invalid; retrying cannot help.
    Client,
    /// Infrastructure-side, transient; safe to retry.
    Server,
    /// Cause unknown; treated as non-retryable to avoid infinite silent retry.
    Unclassified,
}

/// Errors produced by the reconciliation core and its collaborators.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceError {
    #[error("database error: {0}")]
    Database(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("insufficient quota: {0}")]
    InsufficientQuota(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("general error: {0}")]
    General(String),

    #[error("{0}")]
    Unclassified(String),
}

impl ServiceError {
    /// Returns the class driving retry decisions for this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            ServiceError::Validation(_)
            | ServiceError::NotFound(_)
            | ServiceError::InsufficientQuota(_)
            | ServiceError::Conflict(_) => ErrorClass::Client,
            ServiceError::Database(_) | ServiceError::General(_) => ErrorClass::Server,
            ServiceError::Configuration(_) | ServiceError::Unclassified(_) => {
                ErrorClass::Unclassified
            }
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.class() == ErrorClass::Client
    }

    pub fn is_server_error(&self) -> bool {
        self.class() == ErrorClass::Server
    }

    /// Insufficient-quota responses short-circuit a request straight to
    /// `failed` regardless of elapsed time.
    pub fn is_insufficient_quota(&self) -> bool {
        matches!(self, ServiceError::InsufficientQuota(_))
    }

    /// The user-facing reason recorded on a failed request.
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ServiceError::NotFound("row not found".to_string()),
            other => ServiceError::Database(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
