//! Blob storage for uploaded files using Apache OpenDAL.
//!
//! This module provides vendor-agnostic object storage with support for:
//! - S3-compatible: Cloudflare R2, Supabase Storage, AWS S3, DigitalOcean Spaces
//! - Azure Blob Storage
//! - Local filesystem (development only)
//! - In-process memory (tests)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        BlobStore (trait)                        │
//! │                   put(key, bytes, mime) -> url                  │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                 StorageService (Apache OpenDAL)                 │
//! │           op.write_with("key", data)   op.read("key")           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod service;

pub use config::StorageConfig;
pub use corkboard_shared::config::StorageProvider;
pub use error::StorageError;
pub use service::{BlobStore, StorageService, StoredObject};
