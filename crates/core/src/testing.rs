//! In-memory doubles for service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use corkboard_shared::types::{AttachmentId, PostId, UserId};

use crate::post::{Attachment, Author, NewPost, Post, PostError, PostRepository};
use crate::storage::{BlobStore, StorageError, StoredObject};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, String>,
    posts: Vec<Post>,
}

/// Post repository backed by a vector.
#[derive(Clone, Default)]
pub struct InMemoryPosts {
    tables: Arc<Mutex<Tables>>,
    next_id: Arc<AtomicI32>,
    delay: Option<Duration>,
}

impl InMemoryPosts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn add_user(&self, id: UserId, name: &str) {
        self.tables
            .lock()
            .unwrap()
            .users
            .insert(id, name.to_string());
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn next(&self) -> i32 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl PostRepository for InMemoryPosts {
    async fn create(&self, post: NewPost) -> Result<PostId, PostError> {
        self.pause().await;
        let id = PostId::new(self.next());
        let now = Utc::now();
        let attachments = post
            .attachments
            .into_iter()
            .map(|a| Attachment {
                id: AttachmentId::new(self.next()),
                file_url: a.file_url,
                file_key: a.file_key,
                file_name: a.file_name,
                file_type: a.file_type,
                file_size: a.file_size,
                created_at: now,
            })
            .collect();

        let mut tables = self.tables.lock().unwrap();
        let name = tables.users.get(&post.author_id).cloned();
        tables.posts.push(Post {
            id,
            text: post.text,
            created_at: now,
            author: Author {
                id: post.author_id,
                name,
            },
            attachments,
        });
        Ok(id)
    }

    async fn list(&self, limit: u64) -> Result<Vec<Post>, PostError> {
        self.pause().await;
        let mut posts = self.tables.lock().unwrap().posts.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        posts.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(posts)
    }

    async fn delete(&self, id: PostId) -> Result<bool, PostError> {
        self.pause().await;
        let mut tables = self.tables.lock().unwrap();
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        Ok(tables.posts.len() != before)
    }
}

/// Blob store that records puts and fails for chosen file keys.
#[derive(Clone, Default)]
pub struct RecordingStore {
    puts: Arc<Mutex<Vec<(String, Bytes, String)>>>,
    fail_suffixes: Vec<String>,
    delay: Option<Duration>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every put whose key ends with `suffix`.
    pub fn failing_on(mut self, suffix: &str) -> Self {
        self.fail_suffixes.push(suffix.to_string());
        self
    }

    /// Sleep this long before answering each put.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn puts(&self) -> Vec<(String, Bytes, String)> {
        self.puts.lock().unwrap().clone()
    }
}

impl BlobStore for RecordingStore {
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        mime_type: &str,
    ) -> Result<StoredObject, StorageError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_suffixes.iter().any(|s| key.ends_with(s.as_str())) {
            return Err(StorageError::operation("bucket unreachable"));
        }
        self.puts
            .lock()
            .unwrap()
            .push((key.to_string(), bytes, mime_type.to_string()));
        Ok(StoredObject {
            key: key.to_string(),
            url: format!("https://cdn.test/{key}"),
        })
    }
}
