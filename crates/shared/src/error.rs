//! Application-wide error types.

use thiserror::Error;

/// Application error types.
///
/// Every failure in the submission and feed paths collapses into one of these
/// kinds before it reaches a client. None of them is retried automatically.
#[derive(Debug, Error)]
pub enum AppError {
    /// No authenticated session.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad or missing input: disallowed file type, oversized file, empty post.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Blob store unreachable or write rejected.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Storage(_) | Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the message safe to show to an end user.
    ///
    /// Validation and not-found messages are surfaced verbatim; server-side
    /// failures collapse into a generic hint.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized(_) => "Please log in".to_string(),
            Self::Validation(msg) | Self::NotFound(msg) => msg.clone(),
            Self::Storage(_) => "Upload failed".to_string(),
            Self::Database(_) | Self::Internal(_) => "An error occurred".to_string(),
        }
    }
}
