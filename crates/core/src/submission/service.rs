//! Submission service: validate, upload, then create exactly one post.

use std::sync::Arc;
use std::time::Duration;

use corkboard_shared::types::UserId;
use tracing::{debug, info, warn};

use super::error::SubmissionError;
use super::types::{
    FileFailure, IncomingFile, PendingSubmission, SubmissionReceipt, SubmissionStage, UploadedFile,
};
use crate::post::{CreatePostInput, PostError, PostRepository, PostService};
use crate::storage::{BlobStore, StorageError};
use crate::upload::{UploadMode, make_key, validate, validate_file_name};

/// Default upper bound for a single blob write.
pub const DEFAULT_PUT_TIMEOUT: Duration = Duration::from_secs(30);

/// Drives files from a client through the validator and blob store into a post.
#[derive(Debug)]
pub struct SubmissionService<R, B> {
    posts: Arc<PostService<R>>,
    store: Arc<B>,
    put_timeout: Duration,
}

impl<R: PostRepository, B: BlobStore> SubmissionService<R, B> {
    /// Create a service over shared post and blob services.
    pub fn new(posts: Arc<PostService<R>>, store: Arc<B>) -> Self {
        Self {
            posts,
            store,
            put_timeout: DEFAULT_PUT_TIMEOUT,
        }
    }

    /// Override the per-file blob write timeout.
    #[must_use]
    pub fn with_put_timeout(mut self, timeout: Duration) -> Self {
        self.put_timeout = timeout;
        self
    }

    /// The post service submissions end in.
    pub fn posts(&self) -> &PostService<R> {
        &self.posts
    }

    /// Validate and store a single file.
    ///
    /// # Errors
    ///
    /// `Rejected` when the validator refuses the file, `Storage` when the
    /// write fails or times out. Nothing is retried.
    pub async fn upload(
        &self,
        file: &IncomingFile,
        mode: UploadMode,
    ) -> Result<UploadedFile, SubmissionError> {
        admit(file, mode)?;
        self.store_file(file, mode).await
    }

    /// Run a full submission for `caller`.
    ///
    /// On success the pending draft is cleared; on failure it is left as is
    /// so the client can retry. Blobs written before a failure stay in the
    /// store.
    ///
    /// # Errors
    ///
    /// Any abort of the pipeline, see [`SubmissionError`].
    pub async fn submit(
        &self,
        caller: Option<UserId>,
        pending: &mut PendingSubmission,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let mut stage = SubmissionStage::Idle;
        match self.run(caller, pending, &mut stage).await {
            Ok(receipt) => {
                pending.clear();
                info!(
                    post_id = %receipt.post_id,
                    attachments = receipt.attachments.len(),
                    failures = receipt.failures.len(),
                    "Submission done"
                );
                Ok(receipt)
            }
            Err(err) => {
                warn!(stage = %stage, to = %SubmissionStage::Failed, error = %err, "Submission failed");
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        caller: Option<UserId>,
        pending: &PendingSubmission,
        stage: &mut SubmissionStage,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let caller = caller.ok_or(PostError::Unauthenticated)?;
        let mode = pending.mode;
        let mut failures = Vec::new();

        advance(stage, SubmissionStage::Validating);
        if mode == UploadMode::SingleImage && pending.files.len() > 1 {
            return Err(SubmissionError::TooManyFiles {
                count: pending.files.len(),
            });
        }

        let mut admitted = Vec::with_capacity(pending.files.len());
        for file in &pending.files {
            match admit(file, mode) {
                Ok(()) => admitted.push(file),
                Err(err) if mode == UploadMode::MultiFile => {
                    warn!(file_name = %file.file_name, error = %err, "File dropped");
                    failures.push(failure(file, &err));
                }
                Err(err) => return Err(err),
            }
        }

        advance(stage, SubmissionStage::Uploading);
        let mut uploaded = Vec::with_capacity(admitted.len());
        for file in admitted {
            match self.store_file(file, mode).await {
                Ok(stored) => uploaded.push(stored),
                Err(err) if mode == UploadMode::MultiFile => {
                    warn!(file_name = %file.file_name, error = %err, "File dropped");
                    failures.push(failure(file, &err));
                }
                Err(err) => return Err(err),
            }
        }

        advance(stage, SubmissionStage::Submitting);
        let input = CreatePostInput {
            text: Some(pending.text.clone()),
            attachments: uploaded.iter().cloned().map(Into::into).collect(),
        };
        let post_id = self.posts.create(Some(caller), input).await?;

        advance(stage, SubmissionStage::Done);
        Ok(SubmissionReceipt {
            post_id,
            attachments: uploaded,
            failures,
        })
    }

    async fn store_file(
        &self,
        file: &IncomingFile,
        mode: UploadMode,
    ) -> Result<UploadedFile, SubmissionError> {
        let key = make_key(mode.namespace(), &file.file_name);
        let put = self.store.put(&key, file.bytes.clone(), &file.mime_type);
        let stored = match tokio::time::timeout(self.put_timeout, put).await {
            Ok(result) => result,
            Err(_) => {
                warn!(key = %key, timeout = ?self.put_timeout, "Blob write timed out");
                Err(StorageError::Timeout(self.put_timeout))
            }
        }
        .map_err(|source| SubmissionError::Storage {
            file_name: file.file_name.clone(),
            source,
        })?;

        Ok(UploadedFile {
            file_url: stored.url,
            file_key: stored.key,
            file_name: file.file_name.clone(),
            file_type: file.mime_type.clone(),
            file_size: file.size(),
        })
    }
}

fn admit(file: &IncomingFile, mode: UploadMode) -> Result<(), SubmissionError> {
    validate_file_name(&file.file_name)
        .and_then(|()| validate(&file.mime_type, file.size(), mode))
        .map_err(|rejection| SubmissionError::Rejected {
            file_name: file.file_name.clone(),
            rejection,
        })
}

fn failure(file: &IncomingFile, err: &SubmissionError) -> FileFailure {
    FileFailure {
        file_name: file.file_name.clone(),
        code: err.code(),
        message: err.to_string(),
    }
}

fn advance(stage: &mut SubmissionStage, next: SubmissionStage) {
    debug!(from = %stage, to = %next, "Submission stage");
    *stage = next;
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::post::{FeedEvents, PhotoRef};
    use crate::testing::{InMemoryPosts, RecordingStore};
    use crate::upload::UploadRejection;

    const MIB: usize = 1024 * 1024;

    fn setup(store: RecordingStore) -> SubmissionService<InMemoryPosts, RecordingStore> {
        let repo = InMemoryPosts::new();
        repo.add_user(UserId::new(1), "A");
        repo.add_user(UserId::new(2), "B");
        let posts = Arc::new(PostService::new(repo, FeedEvents::new()));
        SubmissionService::new(posts, Arc::new(store))
    }

    fn file(name: &str, mime: &str, size: usize) -> IncomingFile {
        IncomingFile::new(name, mime, Bytes::from(vec![0u8; size]))
    }

    #[tokio::test]
    async fn test_photo_upload_then_create_appears_in_feed() {
        let service = setup(RecordingStore::new());
        let photo = file("photo.png", "image/png", 2 * MIB);

        let uploaded = service.upload(&photo, UploadMode::SingleImage).await.unwrap();
        assert!(uploaded.file_key.starts_with("messages/"));
        assert!(uploaded.file_key.ends_with(".png"));
        assert!(!uploaded.file_url.is_empty());

        let photo_ref = PhotoRef {
            url: uploaded.file_url.clone(),
            key: uploaded.file_key.clone(),
        };
        let id = service
            .posts()
            .create(
                Some(UserId::new(1)),
                CreatePostInput {
                    text: Some("hello".to_string()),
                    attachments: vec![photo_ref.into_attachment()],
                },
            )
            .await
            .unwrap();

        let feed = service.posts().feed().await.unwrap();
        let post = feed.iter().find(|p| p.id == id).unwrap();
        assert_eq!(post.author.name.as_deref(), Some("A"));
        assert_eq!(post.text.as_deref(), Some("hello"));
        assert_eq!(post.attachments[0].file_url, uploaded.file_url);
    }

    #[tokio::test]
    async fn test_empty_submission_is_rejected_without_rows() {
        let service = setup(RecordingStore::new());
        let mut pending = PendingSubmission::new(UploadMode::MultiFile).with_text("");

        let err = service
            .submit(Some(UserId::new(2)), &mut pending)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SubmissionError::Post(PostError::Validation(ref m)) if m == "must have text or attachment"
        ));
        assert!(service.posts().feed().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_image_submit_clears_pending() {
        let store = RecordingStore::new();
        let service = setup(store.clone());
        let mut pending = PendingSubmission::new(UploadMode::SingleImage).with_text("look");
        pending.stage(file("cat.JPG", "image/jpeg", 1024));

        let receipt = service
            .submit(Some(UserId::new(1)), &mut pending)
            .await
            .unwrap();

        assert_eq!(receipt.attachments.len(), 1);
        assert!(receipt.attachments[0].file_key.ends_with(".jpg"));
        assert!(receipt.failures.is_empty());
        assert!(pending.is_empty());
        assert_eq!(store.puts().len(), 1);
        assert_eq!(store.puts()[0].2, "image/jpeg");
        assert_eq!(service.posts().events().revision(), 1);
    }

    #[tokio::test]
    async fn test_single_image_rejection_aborts_before_upload() {
        let store = RecordingStore::new();
        let service = setup(store.clone());
        let mut pending = PendingSubmission::new(UploadMode::SingleImage).with_text("doc");
        pending.stage(file("notes.pdf", "application/pdf", 10));

        let err = service
            .submit(Some(UserId::new(1)), &mut pending)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SubmissionError::Rejected {
                rejection: UploadRejection::NotAnImage { .. },
                ..
            }
        ));
        assert!(store.puts().is_empty());
        assert_eq!(pending.files.len(), 1);
        assert!(service.posts().feed().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_image_oversize_is_too_large_whatever_type() {
        let service = setup(RecordingStore::new());
        let big = file("huge.bin", "application/octet-stream", 5 * MIB + 1);

        let err = service.upload(&big, UploadMode::SingleImage).await.unwrap_err();

        assert!(matches!(
            err,
            SubmissionError::Rejected {
                rejection: UploadRejection::TooLarge { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_single_image_accepts_one_file_only() {
        let store = RecordingStore::new();
        let service = setup(store.clone());
        let mut pending = PendingSubmission::new(UploadMode::SingleImage);
        pending.stage(file("a.png", "image/png", 1));
        pending.stage(file("b.png", "image/png", 1));

        let err = service
            .submit(Some(UserId::new(1)), &mut pending)
            .await
            .unwrap_err();

        assert!(matches!(err, SubmissionError::TooManyFiles { count: 2 }));
        assert!(store.puts().is_empty());
    }

    #[tokio::test]
    async fn test_single_image_storage_failure_aborts() {
        let service = setup(RecordingStore::new().failing_on(".png"));
        let mut pending = PendingSubmission::new(UploadMode::SingleImage).with_text("hi");
        pending.stage(file("a.png", "image/png", 1));

        let err = service
            .submit(Some(UserId::new(1)), &mut pending)
            .await
            .unwrap_err();

        assert!(matches!(err, SubmissionError::Storage { .. }));
        assert!(service.posts().feed().await.unwrap().is_empty());
        assert!(!pending.is_empty());
    }

    #[tokio::test]
    async fn test_multi_file_drops_failures_and_continues() {
        let store = RecordingStore::new().failing_on(".zip");
        let service = setup(store.clone());
        let mut pending = PendingSubmission::new(UploadMode::MultiFile).with_text("week 3");
        pending.stage(file("setup.exe", "application/x-msdownload", 10));
        pending.stage(file("slides.zip", "application/zip", 10));
        pending.stage(file("notes.pdf", "application/pdf", 10));

        let receipt = service
            .submit(Some(UserId::new(1)), &mut pending)
            .await
            .unwrap();

        assert_eq!(receipt.attachments.len(), 1);
        assert_eq!(receipt.attachments[0].file_name, "notes.pdf");
        assert!(receipt.attachments[0].file_key.starts_with("school-files/"));
        let codes: Vec<&str> = receipt.failures.iter().map(|f| f.code).collect();
        assert_eq!(codes, vec!["type_not_allowed", "upload_failed"]);

        let feed = service.posts().feed().await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].attachments.len(), 1);
        assert_eq!(feed[0].attachments[0].file_size, 10);
    }

    #[tokio::test]
    async fn test_multi_file_all_failed_without_text_is_rejected() {
        let service = setup(RecordingStore::new());
        let mut pending = PendingSubmission::new(UploadMode::MultiFile);
        pending.stage(file("movie.mp4", "video/mp4", 10));

        let err = service
            .submit(Some(UserId::new(1)), &mut pending)
            .await
            .unwrap_err();

        assert!(matches!(err, SubmissionError::Post(PostError::Validation(_))));
        assert!(service.posts().feed().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overlong_file_name_is_rejected_before_upload() {
        let store = RecordingStore::new();
        let service = setup(store.clone());
        let long_name = format!("a.{}", "x".repeat(300));

        let err = service
            .upload(&file(&long_name, "image/png", 10), UploadMode::SingleImage)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "file_name_too_long");

        let mut pending = PendingSubmission::new(UploadMode::MultiFile).with_text("notes");
        pending.stage(file(&format!("{long_name}.pdf"), "application/pdf", 10));
        pending.stage(file("ok.pdf", "application/pdf", 10));
        let receipt = service
            .submit(Some(UserId::new(1)), &mut pending)
            .await
            .unwrap();

        assert_eq!(receipt.attachments.len(), 1);
        assert_eq!(receipt.failures[0].code, "file_name_too_long");
        assert_eq!(store.puts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_times_out_and_creates_nothing() {
        let service = setup(RecordingStore::new().with_delay(Duration::from_secs(60)))
            .with_put_timeout(Duration::from_secs(1));
        let mut pending = PendingSubmission::new(UploadMode::SingleImage).with_text("hi");
        pending.stage(file("a.png", "image/png", 1));

        let err = service
            .submit(Some(UserId::new(1)), &mut pending)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SubmissionError::Storage {
                source: StorageError::Timeout(d),
                ..
            } if d == Duration::from_secs(1)
        ));
        assert_eq!(err.code(), "upload_failed");
        assert!(service.posts().feed().await.unwrap().is_empty());
        assert!(!pending.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_multi_file_timeout_is_reported_per_file() {
        let service = setup(RecordingStore::new().with_delay(Duration::from_secs(60)))
            .with_put_timeout(Duration::from_secs(1));
        let mut pending = PendingSubmission::new(UploadMode::MultiFile).with_text("still posts");
        pending.stage(file("notes.pdf", "application/pdf", 10));

        let receipt = service
            .submit(Some(UserId::new(1)), &mut pending)
            .await
            .unwrap();

        assert!(receipt.attachments.is_empty());
        assert_eq!(receipt.failures[0].code, "upload_failed");
        let feed = service.posts().feed().await.unwrap();
        assert_eq!(feed[0].text.as_deref(), Some("still posts"));
    }

    #[tokio::test]
    async fn test_unauthenticated_submit_uploads_nothing() {
        let store = RecordingStore::new();
        let service = setup(store.clone());
        let mut pending = PendingSubmission::new(UploadMode::MultiFile).with_text("hi");
        pending.stage(file("notes.pdf", "application/pdf", 10));

        let err = service.submit(None, &mut pending).await.unwrap_err();

        assert!(matches!(err, SubmissionError::Post(PostError::Unauthenticated)));
        assert!(store.puts().is_empty());
    }
}
