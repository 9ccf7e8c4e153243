//! Upload admission: what may be stored, and under which key.
//!
//! Both checks run before a single byte reaches the blob store.

mod key;
mod validator;

pub use key::{Namespace, make_key, make_key_at};
pub use validator::{
    MAX_FILE_BYTES, MAX_FILE_NAME_CHARS, MAX_IMAGE_BYTES, MAX_MIME_TYPE_CHARS,
    MULTI_FILE_ALLOWED_TYPES, UploadMode, UploadRejection, validate, validate_file_name,
};
