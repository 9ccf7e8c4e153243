//! Submission orchestration.
//!
//! A submission moves through these stages, each logged:
//!
//! ```text
//! Idle -> Validating -> Uploading -> Submitting -> Done
//!              \             \            \
//!               `-------------`------------`----> Failed
//! ```
//!
//! In multi-file mode a file that fails validation or upload is reported in
//! the receipt and left out; the rest of the submission continues. In
//! single-image mode any such failure aborts the whole submission.

mod error;
mod service;
mod types;

pub use error::SubmissionError;
pub use service::{DEFAULT_PUT_TIMEOUT, SubmissionService};
pub use types::{
    FileFailure, IncomingFile, PendingSubmission, SubmissionReceipt, SubmissionStage, UploadedFile,
};
