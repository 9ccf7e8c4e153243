//! Blob download route for deployments that serve uploads themselves.

use axum::{
    Router,
    extract::{Path, State},
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    response::IntoResponse,
    routing::get,
};

use crate::AppState;
use crate::error::ApiError;

/// Creates the file routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/files/{*key}", get(download))
}

/// GET `/files/{*key}`
async fn download(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = state.storage.read(&key).await?;
    let content_type = mime_guess::from_path(&key)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    // Keys are never reused
    Ok((
        [
            (CONTENT_TYPE, content_type),
            (CACHE_CONTROL, "public, max-age=31536000, immutable".to_string()),
        ],
        bytes,
    ))
}
