//! Submission error types.

use corkboard_shared::AppError;
use thiserror::Error;

use crate::post::PostError;
use crate::storage::StorageError;
use crate::upload::UploadRejection;

/// Why a submission or upload was abandoned.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// A file failed validation.
    #[error("{file_name}: {rejection}")]
    Rejected {
        /// Client-side file name.
        file_name: String,
        /// Rule the file broke.
        rejection: UploadRejection,
    },

    /// Single-image mode got more than one file.
    #[error("only one image may be attached, got {count}")]
    TooManyFiles {
        /// Number of staged files.
        count: usize,
    },

    /// The blob store failed a write.
    #[error("upload of {file_name} failed: {source}")]
    Storage {
        /// Client-side file name.
        file_name: String,
        /// Underlying failure.
        #[source]
        source: StorageError,
    },

    /// Post creation failed.
    #[error(transparent)]
    Post(#[from] PostError),
}

impl SubmissionError {
    /// Machine-readable code, also used for per-file failures.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Rejected { rejection, .. } => rejection.code(),
            Self::TooManyFiles { .. } => "too_many_files",
            Self::Storage { .. } => "upload_failed",
            Self::Post(_) => "post_failed",
        }
    }
}

impl From<SubmissionError> for AppError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Rejected { .. } | SubmissionError::TooManyFiles { .. } => {
                Self::Validation(err.to_string())
            }
            SubmissionError::Storage { .. } => Self::Storage(err.to_string()),
            SubmissionError::Post(post) => post.into(),
        }
    }
}
