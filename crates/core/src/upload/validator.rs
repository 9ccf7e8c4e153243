//! Upload validation by declared MIME type and size.

use corkboard_shared::AppError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::key::Namespace;

/// Ceiling for a single-image attachment: 5 MiB.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Ceiling for a general attachment: 50 MiB.
pub const MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// Longest client-side file name that can be recorded on an attachment.
pub const MAX_FILE_NAME_CHARS: usize = 255;

/// Longest declared MIME type that can be recorded on an attachment.
pub const MAX_MIME_TYPE_CHARS: usize = 127;

/// MIME types accepted in multi-file mode.
pub const MULTI_FILE_ALLOWED_TYPES: &[&str] = &[
    // Images
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    // Documents
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    // Archives
    "application/zip",
    "application/x-rar-compressed",
    // Text
    "text/plain",
    "text/csv",
];

/// Which admission policy applies to an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadMode {
    /// One photo per post, any `image/*` type.
    SingleImage,
    /// Any number of files from the allow-list.
    #[default]
    MultiFile,
}

impl UploadMode {
    /// Size ceiling for this mode.
    #[must_use]
    pub const fn max_bytes(self) -> u64 {
        match self {
            Self::SingleImage => MAX_IMAGE_BYTES,
            Self::MultiFile => MAX_FILE_BYTES,
        }
    }

    /// Key namespace uploads in this mode are stored under.
    #[must_use]
    pub const fn namespace(self) -> Namespace {
        match self {
            Self::SingleImage => Namespace::Photos,
            Self::MultiFile => Namespace::Files,
        }
    }

    /// Parse from a wire value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "single_image" | "single-image" => Some(Self::SingleImage),
            "multi_file" | "multi-file" => Some(Self::MultiFile),
            _ => None,
        }
    }
}

/// Why an upload was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    /// The request carried no file part.
    #[error("no file provided")]
    NoFile,

    /// Single-image mode got something other than `image/*`.
    #[error("not an image: {mime_type}")]
    NotAnImage {
        /// Declared MIME type.
        mime_type: String,
    },

    /// Multi-file mode got a type outside the allow-list.
    #[error(
        "type not allowed: {mime_type}. Supported: images, PDF, Word, Excel, PowerPoint, ZIP, RAR, text files"
    )]
    TypeNotAllowed {
        /// Declared MIME type.
        mime_type: String,
    },

    /// Declared MIME type longer than an attachment can record.
    #[error("type too long: {len} characters exceeds maximum {max}")]
    TypeTooLong {
        /// Length of the declared type, in characters.
        len: usize,
        /// Longest accepted type.
        max: usize,
    },

    /// File name longer than an attachment can record.
    #[error("file name too long: {len} characters exceeds maximum {max}")]
    NameTooLong {
        /// Length of the name, in characters.
        len: usize,
        /// Longest accepted name.
        max: usize,
    },

    /// File exceeds the mode's ceiling.
    #[error("too large: {size} bytes exceeds maximum {max} bytes")]
    TooLarge {
        /// Declared size.
        size: u64,
        /// Ceiling for the mode.
        max: u64,
    },
}

impl UploadRejection {
    /// Stable machine-readable code for API responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NoFile => "no_file",
            Self::NotAnImage { .. } => "not_an_image",
            Self::TypeNotAllowed { .. } => "type_not_allowed",
            Self::TypeTooLong { .. } => "type_too_long",
            Self::NameTooLong { .. } => "file_name_too_long",
            Self::TooLarge { .. } => "file_too_large",
        }
    }
}

/// Accept or reject a file by its declared MIME type and size.
///
/// Single-image mode checks the size first, so an oversized file is too
/// large whatever its type. Multi-file mode checks the allow-list first.
///
/// # Errors
///
/// Returns the first rule the file breaks.
pub fn validate(mime_type: &str, byte_size: u64, mode: UploadMode) -> Result<(), UploadRejection> {
    match mode {
        UploadMode::SingleImage => {
            check_size(byte_size, mode)?;
            if !mime_type.starts_with("image/") {
                return Err(UploadRejection::NotAnImage {
                    mime_type: mime_type.to_string(),
                });
            }
            let len = mime_type.chars().count();
            if len > MAX_MIME_TYPE_CHARS {
                return Err(UploadRejection::TypeTooLong {
                    len,
                    max: MAX_MIME_TYPE_CHARS,
                });
            }
            Ok(())
        }
        UploadMode::MultiFile => {
            if !MULTI_FILE_ALLOWED_TYPES.contains(&mime_type) {
                return Err(UploadRejection::TypeNotAllowed {
                    mime_type: mime_type.to_string(),
                });
            }
            check_size(byte_size, mode)
        }
    }
}

/// Reject client-side file names too long to record.
///
/// # Errors
///
/// Returns [`UploadRejection::NameTooLong`] past [`MAX_FILE_NAME_CHARS`].
pub fn validate_file_name(file_name: &str) -> Result<(), UploadRejection> {
    let len = file_name.chars().count();
    if len > MAX_FILE_NAME_CHARS {
        return Err(UploadRejection::NameTooLong {
            len,
            max: MAX_FILE_NAME_CHARS,
        });
    }
    Ok(())
}

fn check_size(byte_size: u64, mode: UploadMode) -> Result<(), UploadRejection> {
    let max = mode.max_bytes();
    if byte_size > max {
        return Err(UploadRejection::TooLarge {
            size: byte_size,
            max,
        });
    }
    Ok(())
}

impl From<UploadRejection> for AppError {
    fn from(err: UploadRejection) -> Self {
        Self::Validation(err.to_string())
    }
}
