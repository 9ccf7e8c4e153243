//! Submission types.

use std::fmt;

use bytes::Bytes;
use corkboard_shared::types::PostId;
use serde::Serialize;

use crate::post::AttachmentInput;
use crate::upload::UploadMode;

/// A file as received from a client, before validation.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    /// Client-side file name.
    pub file_name: String,
    /// Declared MIME type.
    pub mime_type: String,
    /// File contents.
    pub bytes: Bytes,
}

impl IncomingFile {
    /// Create an incoming file.
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// A file that made it into the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// Public URL.
    pub file_url: String,
    /// Storage key.
    pub file_key: String,
    /// Client-side file name.
    pub file_name: String,
    /// MIME type.
    pub file_type: String,
    /// Size in bytes.
    pub file_size: u64,
}

impl From<UploadedFile> for AttachmentInput {
    fn from(file: UploadedFile) -> Self {
        Self {
            file_url: file.file_url,
            file_key: file.file_key,
            file_name: file.file_name,
            file_type: file.file_type,
            file_size: i64::try_from(file.file_size).unwrap_or(i64::MAX),
        }
    }
}

/// A file left out of a multi-file submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFailure {
    /// Client-side file name.
    pub file_name: String,
    /// Machine-readable reason.
    pub code: &'static str,
    /// Human-readable reason.
    pub message: String,
}

/// Client-held state of a post being composed.
#[derive(Debug, Clone, Default)]
pub struct PendingSubmission {
    /// How staged files are validated.
    pub mode: UploadMode,
    /// Draft text.
    pub text: String,
    /// Files staged for upload, in order.
    pub files: Vec<IncomingFile>,
}

impl PendingSubmission {
    /// Empty draft in `mode`.
    #[must_use]
    pub fn new(mode: UploadMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Replace the draft text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Stage another file.
    pub fn stage(&mut self, file: IncomingFile) {
        self.files.push(file);
    }

    /// Drop text and staged files, keeping the mode.
    pub fn clear(&mut self) {
        self.text.clear();
        self.files.clear();
    }

    /// Whether there is nothing to submit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.files.is_empty()
    }
}

/// Where a submission is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    /// Nothing started.
    Idle,
    /// Files are being checked.
    Validating,
    /// Files are being written to the blob store.
    Uploading,
    /// The post row is being created.
    Submitting,
    /// The post exists.
    Done,
    /// The submission was abandoned.
    Failed,
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Uploading => "uploading",
            Self::Submitting => "submitting",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    /// The new post.
    pub post_id: PostId,
    /// Files attached to it.
    pub attachments: Vec<UploadedFile>,
    /// Files that were left out.
    pub failures: Vec<FileFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_keeps_mode() {
        let mut pending = PendingSubmission::new(UploadMode::SingleImage).with_text("hi");
        pending.stage(IncomingFile::new("a.png", "image/png", Bytes::from_static(b"x")));
        assert!(!pending.is_empty());

        pending.clear();

        assert!(pending.is_empty());
        assert_eq!(pending.mode, UploadMode::SingleImage);
    }

    #[test]
    fn test_whitespace_only_draft_is_empty() {
        assert!(PendingSubmission::default().with_text("  \n").is_empty());
    }

    #[test]
    fn test_uploaded_file_into_attachment() {
        let attachment: AttachmentInput = UploadedFile {
            file_url: "u".into(),
            file_key: "k".into(),
            file_name: "n".into(),
            file_type: "t".into(),
            file_size: 2048,
        }
        .into();
        assert_eq!(attachment.file_size, 2048);
    }
}
