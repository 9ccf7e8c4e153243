//! Upload routes.
//!
//! Files arrive as `multipart/form-data`, pass the upload validator and are
//! written to the blob store under a fresh key. The response carries what a
//! client needs to attach the file to a post.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    routing::post,
};
use serde::Serialize;
use tracing::info;

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use corkboard_core::submission::{IncomingFile, UploadedFile};
use corkboard_core::upload::{MAX_FILE_BYTES, UploadMode, UploadRejection};

/// Request body ceiling for a single upload: the largest file plus form overhead.
#[allow(clippy::cast_possible_truncation)]
pub const UPLOAD_BODY_LIMIT: usize = MAX_FILE_BYTES as usize + 1024 * 1024;

/// Creates the upload routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/upload/photo", post(upload_photo))
        .route("/upload", post(upload_file))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

/// Response for a stored file.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Public URL.
    pub url: String,
    /// Storage key.
    pub key: String,
    /// Client-side file name.
    pub file_name: String,
    /// MIME type.
    pub file_type: String,
    /// Size in bytes.
    pub file_size: u64,
}

impl From<UploadedFile> for UploadResponse {
    fn from(file: UploadedFile) -> Self {
        Self {
            url: file.file_url,
            key: file.file_key,
            file_name: file.file_name,
            file_type: file.file_type,
            file_size: file.file_size,
        }
    }
}

/// Files and text fields of a multipart form.
#[derive(Debug, Default)]
pub(crate) struct Form {
    pub files: Vec<IncomingFile>,
    pub fields: HashMap<String, String>,
}

/// Read a multipart body. Parts named `file` are files, others text.
pub(crate) async fn read_form(mut multipart: Multipart) -> Result<Form, ApiError> {
    let mut form = Form::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let mime_type = field.content_type().map_or_else(
                || {
                    mime_guess::from_path(&file_name)
                        .first_or_octet_stream()
                        .essence_str()
                        .to_string()
                },
                str::to_string,
            );
            let bytes = field.bytes().await.map_err(multipart_error)?;
            form.files.push(IncomingFile::new(file_name, mime_type, bytes));
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::new(err.status(), "invalid_multipart", err.body_text())
}

async fn upload_one(
    state: &AppState,
    auth: &AuthUser,
    multipart: Multipart,
    mode: UploadMode,
) -> Result<Json<UploadResponse>, ApiError> {
    let form = read_form(multipart).await?;
    let file = form
        .files
        .into_iter()
        .next()
        .ok_or(UploadRejection::NoFile)?;

    let uploaded = state.submissions.upload(&file, mode).await?;

    info!(
        user_id = %auth.user_id(),
        key = %uploaded.file_key,
        size = uploaded.file_size,
        "File uploaded"
    );
    Ok(Json(uploaded.into()))
}

/// POST `/upload/photo`
/// Store one image for a post.
async fn upload_photo(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    upload_one(&state, &auth, multipart, UploadMode::SingleImage).await
}

/// POST `/upload`
/// Store one document or image for a post.
async fn upload_file(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    upload_one(&state, &auth, multipart, UploadMode::MultiFile).await
}
