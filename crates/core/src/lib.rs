//! Core business logic for Corkboard.
//!
//! This crate contains the post board's domain rules with ZERO web or database dependencies.
//! Persistence is reached through the [`post::PostRepository`] trait and blobs through
//! [`storage::BlobStore`].
//!
//! # Modules
//!
//! - `upload` - Upload validation and storage key generation
//! - `storage` - Blob storage over OpenDAL
//! - `post` - Posts, the feed, and feed refresh events
//! - `submission` - The validate, upload, create pipeline

pub mod post;
pub mod storage;
pub mod submission;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;
