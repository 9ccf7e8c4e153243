//! Post service and the repository seam it drives.

use std::future::Future;
use std::time::Duration;

use corkboard_shared::types::{PostId, UserId};
use tracing::{debug, info, warn};

use super::error::PostError;
use super::events::FeedEvents;
use super::types::{CreatePostInput, FEED_LIMIT, MAX_TEXT_CHARS, NewPost, Post};

/// Default upper bound for a single repository call.
pub const DEFAULT_REPOSITORY_TIMEOUT: Duration = Duration::from_secs(10);

/// Persistence for posts and their attachments.
///
/// Implementations must insert a post together with its attachments
/// atomically, and remove them together on delete.
pub trait PostRepository: Send + Sync {
    /// Persist a validated post and return its id.
    fn create(&self, post: NewPost) -> impl Future<Output = Result<PostId, PostError>> + Send;

    /// Newest posts first, at most `limit`, each with author and attachments.
    ///
    /// Posts with the same `created_at` are ordered by descending id.
    fn list(&self, limit: u64) -> impl Future<Output = Result<Vec<Post>, PostError>> + Send;

    /// Remove a post and its attachments. Returns `false` when nothing matched.
    fn delete(&self, id: PostId) -> impl Future<Output = Result<bool, PostError>> + Send;
}

/// Post business rules on top of a [`PostRepository`].
#[derive(Debug)]
pub struct PostService<R> {
    repository: R,
    events: FeedEvents,
    timeout: Duration,
}

impl<R: PostRepository> PostService<R> {
    /// Create a service publishing to `events`.
    pub fn new(repository: R, events: FeedEvents) -> Self {
        Self {
            repository,
            events,
            timeout: DEFAULT_REPOSITORY_TIMEOUT,
        }
    }

    /// Override the per-call repository timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The feed refresh signal.
    pub fn events(&self) -> &FeedEvents {
        &self.events
    }

    /// Check the caller and normalize input into a [`NewPost`].
    ///
    /// Text is trimmed and blank text is dropped. The result has text or at
    /// least one attachment.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` without a caller and `Validation` when an
    /// invariant does not hold.
    pub fn prepare(caller: Option<UserId>, input: CreatePostInput) -> Result<NewPost, PostError> {
        let author_id = caller.ok_or(PostError::Unauthenticated)?;

        let text = input
            .text
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        if text
            .as_ref()
            .is_some_and(|text| text.chars().count() > MAX_TEXT_CHARS)
        {
            return Err(PostError::validation(format!(
                "text must be at most {MAX_TEXT_CHARS} characters"
            )));
        }

        if let Some(problem) = input.attachments.iter().find_map(|a| a.problem()) {
            return Err(PostError::validation(problem));
        }

        if text.is_none() && input.attachments.is_empty() {
            return Err(PostError::validation("must have text or attachment"));
        }

        Ok(NewPost {
            author_id,
            text,
            attachments: input.attachments,
        })
    }

    /// Create a post for `caller`.
    ///
    /// # Errors
    ///
    /// See [`Self::prepare`]; repository failures and timeouts are passed on.
    pub async fn create(
        &self,
        caller: Option<UserId>,
        input: CreatePostInput,
    ) -> Result<PostId, PostError> {
        let post = Self::prepare(caller, input)?;
        let author_id = post.author_id;
        let attachments = post.attachments.len();

        let id = self.bounded("create", self.repository.create(post)).await?;

        info!(post_id = %id, author_id = %author_id, attachments, "Post created");
        self.events.notify();
        Ok(id)
    }

    /// Newest posts first, capped at [`FEED_LIMIT`].
    ///
    /// # Errors
    ///
    /// Repository failures and timeouts.
    pub async fn list(&self, limit: u64) -> Result<Vec<Post>, PostError> {
        let limit = limit.min(FEED_LIMIT);
        let posts = self.bounded("list", self.repository.list(limit)).await?;
        debug!(limit, returned = posts.len(), "Feed read");
        Ok(posts)
    }

    /// The feed as readers see it.
    ///
    /// # Errors
    ///
    /// Repository failures and timeouts.
    pub async fn feed(&self) -> Result<Vec<Post>, PostError> {
        self.list(FEED_LIMIT).await
    }

    /// Delete a post. Any authenticated caller may delete any post.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` without a caller, `NotFound` when the post is gone.
    pub async fn delete(&self, caller: Option<UserId>, id: PostId) -> Result<(), PostError> {
        let caller = caller.ok_or(PostError::Unauthenticated)?;

        if !self.bounded("delete", self.repository.delete(id)).await? {
            return Err(PostError::NotFound(id));
        }

        info!(post_id = %id, deleted_by = %caller, "Post deleted");
        self.events.notify();
        Ok(())
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, PostError>>,
    ) -> Result<T, PostError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, timeout = ?self.timeout, "Repository call timed out");
                Err(PostError::Timeout(self.timeout))
            }
        }
    }
}
