//! Storage key derivation.
//!
//! Format: `{namespace}/{token}-{unix_ms}.{ext}`. The token is what makes keys
//! unguessable; the timestamp only spreads them out.

use chrono::Utc;
use rand::{Rng, distr::Alphanumeric};
use serde::{Deserialize, Serialize};

/// Length of the random key token (about 125 bits of entropy).
const TOKEN_LEN: usize = 21;

/// Longest extension carried into a key; longer ones fall back to the default.
const MAX_EXTENSION_LEN: usize = 16;

/// Key prefix grouping uploads by purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    /// Photos attached to posts.
    Photos,
    /// General documents and files.
    Files,
}

impl Namespace {
    /// Key prefix for this namespace.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Photos => "messages",
            Self::Files => "school-files",
        }
    }

    /// Extension used when the original name has none.
    #[must_use]
    pub const fn default_extension(self) -> &'static str {
        match self {
            Self::Photos => "jpg",
            Self::Files => "bin",
        }
    }
}

/// Derive a fresh storage key for `original_file_name` under `namespace`.
#[must_use]
pub fn make_key(namespace: Namespace, original_file_name: &str) -> String {
    make_key_at(namespace, original_file_name, Utc::now().timestamp_millis())
}

/// Same as [`make_key`] with an explicit millisecond timestamp.
#[must_use]
pub fn make_key_at(namespace: Namespace, original_file_name: &str, unix_ms: i64) -> String {
    let token: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect();
    let ext = extension_of(original_file_name).unwrap_or_else(|| namespace.default_extension().to_string());

    format!("{}/{token}-{unix_ms}.{ext}", namespace.prefix())
}

/// Last dot-segment of a file name, lowercased and reduced to ASCII alphanumerics.
fn extension_of(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext: String = ext
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    (!ext.is_empty() && ext.len() <= MAX_EXTENSION_LEN).then_some(ext)
}
