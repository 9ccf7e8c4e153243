//! Post types shared by the submission and feed paths.

use chrono::{DateTime, Utc};
use corkboard_shared::types::{AttachmentId, PostId, UserId};
use serde::{Deserialize, Serialize};

use crate::upload::{MAX_FILE_NAME_CHARS, MAX_MIME_TYPE_CHARS};

/// Maximum post text length, in characters.
pub const MAX_TEXT_CHARS: usize = 5000;

/// Number of posts the feed returns.
pub const FEED_LIMIT: u64 = 100;

/// Longest storage key an attachment can record.
pub const MAX_FILE_KEY_CHARS: usize = 255;

/// Metadata of an already-stored file, as the client hands it back on create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentInput {
    /// Public URL of the blob.
    pub file_url: String,
    /// Storage key of the blob.
    pub file_key: String,
    /// Original file name.
    pub file_name: String,
    /// MIME type.
    pub file_type: String,
    /// Size in bytes; 0 when the client did not report one.
    pub file_size: i64,
}

impl AttachmentInput {
    /// First missing or malformed field, if any.
    pub(crate) fn problem(&self) -> Option<&'static str> {
        if self.file_url.trim().is_empty() {
            Some("attachment fileUrl must not be empty")
        } else if self.file_key.trim().is_empty() {
            Some("attachment fileKey must not be empty")
        } else if self.file_name.trim().is_empty() {
            Some("attachment fileName must not be empty")
        } else if self.file_type.trim().is_empty() {
            Some("attachment fileType must not be empty")
        } else if self.file_key.chars().count() > MAX_FILE_KEY_CHARS {
            Some("attachment fileKey must be at most 255 characters")
        } else if self.file_name.chars().count() > MAX_FILE_NAME_CHARS {
            Some("attachment fileName must be at most 255 characters")
        } else if self.file_type.chars().count() > MAX_MIME_TYPE_CHARS {
            Some("attachment fileType must be at most 127 characters")
        } else if self.file_size < 0 {
            Some("attachment fileSize must not be negative")
        } else {
            None
        }
    }
}

/// A single photo reference from the photo upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRef {
    /// Public URL of the photo.
    pub url: String,
    /// Storage key of the photo.
    pub key: String,
}

impl PhotoRef {
    /// Store a photo as a regular image attachment.
    ///
    /// The name is the last key segment and the type is guessed from its
    /// extension. The photo endpoint never reports a size, so it is stored as 0.
    #[must_use]
    pub fn into_attachment(self) -> AttachmentInput {
        let file_name = self
            .key
            .rsplit('/')
            .next()
            .unwrap_or(&self.key)
            .to_string();
        let file_type = mime_guess::from_path(&file_name)
            .first()
            .filter(|mime| mime.type_() == mime_guess::mime::IMAGE)
            .map_or_else(|| "image/jpeg".to_string(), |mime| mime.essence_str().to_string());

        AttachmentInput {
            file_url: self.url,
            file_key: self.key,
            file_name,
            file_type,
            file_size: 0,
        }
    }
}

/// What a caller asks to publish.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatePostInput {
    /// Free text, trimmed before it is stored.
    pub text: Option<String>,
    /// Files already in the blob store.
    pub attachments: Vec<AttachmentInput>,
}

/// A validated post ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    /// Authenticated author.
    pub author_id: UserId,
    /// Trimmed, non-empty text.
    pub text: Option<String>,
    /// Attachments to link to the post.
    pub attachments: Vec<AttachmentInput>,
}

/// Author as shown in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// User ID.
    pub id: UserId,
    /// Display name.
    pub name: Option<String>,
}

/// A stored attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Attachment ID.
    pub id: AttachmentId,
    /// Public URL.
    pub file_url: String,
    /// Storage key.
    pub file_key: String,
    /// Original file name.
    pub file_name: String,
    /// MIME type.
    pub file_type: String,
    /// Size in bytes.
    pub file_size: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Post ID.
    pub id: PostId,
    /// Free text.
    pub text: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Author.
    pub author: Author,
    /// Attachments in upload order.
    pub attachments: Vec<Attachment>,
}
