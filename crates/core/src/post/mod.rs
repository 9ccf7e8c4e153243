//! Posts and the feed.
//!
//! This module provides business logic for posts including:
//! - Post creation with the text-or-attachment invariant
//! - Newest-first feed reads
//! - Deletion by id
//! - Feed refresh events

mod error;
mod events;
mod service;
mod types;

pub use error::PostError;
pub use events::FeedEvents;
pub use service::{DEFAULT_REPOSITORY_TIMEOUT, PostRepository, PostService};
pub use types::{
    Attachment, AttachmentInput, Author, CreatePostInput, FEED_LIMIT, MAX_FILE_KEY_CHARS,
    MAX_TEXT_CHARS, NewPost, PhotoRef, Post,
};
