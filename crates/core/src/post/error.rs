//! Post error types.

use std::time::Duration;

use corkboard_shared::AppError;
use corkboard_shared::types::PostId;
use thiserror::Error;

/// Errors that can occur while creating, listing or deleting posts.
#[derive(Debug, Error)]
pub enum PostError {
    /// No authenticated caller.
    #[error("Authentication required")]
    Unauthenticated,

    /// Input breaks a post invariant.
    #[error("{0}")]
    Validation(String),

    /// Post does not exist.
    #[error("Post {0} not found")]
    NotFound(PostId),

    /// The repository failed.
    #[error("Repository error: {0}")]
    Repository(String),

    /// The repository did not answer in time.
    #[error("Repository call timed out after {0:?}")]
    Timeout(Duration),
}

impl PostError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated => 401,
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Repository(_) | Self::Timeout(_) => 500,
        }
    }
}

impl From<PostError> for AppError {
    fn from(err: PostError) -> Self {
        match err {
            PostError::Unauthenticated => Self::Unauthorized(err.to_string()),
            PostError::Validation(msg) => Self::Validation(msg),
            PostError::NotFound(_) => Self::NotFound(err.to_string()),
            PostError::Repository(_) | PostError::Timeout(_) => Self::Database(err.to_string()),
        }
    }
}
