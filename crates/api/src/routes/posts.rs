//! Post and feed routes.

use std::convert::Infallible;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, rejection::PathRejection},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use tokio_stream::{Stream, StreamExt, wrappers::WatchStream};
use validator::Validate;

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::routes::uploads::{UPLOAD_BODY_LIMIT, read_form};
use corkboard_core::post::{AttachmentInput, CreatePostInput, MAX_TEXT_CHARS, PhotoRef, Post};
use corkboard_core::submission::{PendingSubmission, SubmissionReceipt};
use corkboard_core::upload::UploadMode;
use corkboard_shared::types::PostId;

/// Most files accepted by one multipart submission.
pub const MAX_SUBMISSION_FILES: usize = 10;

/// Creates the post routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/events", get(feed_events))
        .route("/posts/{id}", delete(delete_post))
        .route(
            "/posts/submit",
            post(submit_post).layer(DefaultBodyLimit::max(
                UPLOAD_BODY_LIMIT * MAX_SUBMISSION_FILES,
            )),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// An already-uploaded file to attach.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRequest {
    /// Public URL from the upload response.
    #[validate(length(min = 1))]
    pub file_url: String,
    /// Storage key from the upload response.
    #[validate(length(min = 1, max = 255))]
    pub file_key: String,
    /// Client-side file name.
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
    /// MIME type.
    #[validate(length(min = 1, max = 127))]
    pub file_type: String,
    /// Size in bytes.
    #[validate(range(min = 0))]
    pub file_size: i64,
}

impl From<AttachmentRequest> for AttachmentInput {
    fn from(req: AttachmentRequest) -> Self {
        Self {
            file_url: req.file_url,
            file_key: req.file_key,
            file_name: req.file_name,
            file_type: req.file_type,
            file_size: req.file_size,
        }
    }
}

/// Request body for creating a post.
///
/// Either `attachments`, or the single-photo pair `photoUrl` + `photoKey`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    /// Free text. Its length is checked after trimming, by the post service.
    pub text: Option<String>,
    /// Files to attach.
    #[serde(default)]
    #[validate(nested)]
    pub attachments: Vec<AttachmentRequest>,
    /// URL of a photo from `/upload/photo`.
    pub photo_url: Option<String>,
    /// Key of a photo from `/upload/photo`.
    pub photo_key: Option<String>,
}

impl CreatePostRequest {
    fn into_input(self) -> Result<CreatePostInput, ApiError> {
        let mut attachments: Vec<AttachmentInput> =
            self.attachments.into_iter().map(Into::into).collect();

        match (self.photo_url, self.photo_key) {
            (Some(url), Some(key)) => attachments.push(PhotoRef { url, key }.into_attachment()),
            (None, None) => {}
            _ => {
                return Err(ApiError::bad_request(
                    "VALIDATION_ERROR",
                    "photoUrl and photoKey must be sent together",
                ));
            }
        }

        Ok(CreatePostInput {
            text: self.text,
            attachments,
        })
    }
}

/// Response for a created post.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    /// New post ID.
    pub id: PostId,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/posts`
/// The newest posts, newest first.
async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    Ok(Json(state.posts.feed().await?))
}

/// POST `/posts`
/// Create a post from text and already-uploaded files.
async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::bad_request("VALIDATION_ERROR", e.to_string()))?;

    let id = state
        .posts
        .create(Some(auth.user_id()), payload.into_input()?)
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// POST `/posts/submit`
/// Upload files and create the post in one request.
///
/// Form fields: `text`, `mode` (`single_image` or `multi_file`, default
/// `multi_file`) and any number of `file` parts.
async fn submit_post(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmissionReceipt>), ApiError> {
    let mut form = read_form(multipart).await?;

    let mode = match form.fields.get("mode") {
        None => UploadMode::default(),
        Some(raw) => UploadMode::parse(raw).ok_or_else(|| {
            ApiError::bad_request("VALIDATION_ERROR", format!("unknown upload mode: {raw}"))
        })?,
    };
    if form.files.len() > MAX_SUBMISSION_FILES {
        return Err(ApiError::bad_request(
            "too_many_files",
            format!("at most {MAX_SUBMISSION_FILES} files per post"),
        ));
    }

    let text = form.fields.remove("text").unwrap_or_default();
    if text.trim().chars().count() > MAX_TEXT_CHARS {
        return Err(ApiError::bad_request(
            "VALIDATION_ERROR",
            format!("text must be at most {MAX_TEXT_CHARS} characters"),
        ));
    }

    let mut pending = PendingSubmission::new(mode).with_text(text);
    for file in form.files {
        pending.stage(file);
    }

    let receipt = state
        .submissions
        .submit(Some(auth.user_id()), &mut pending)
        .await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

/// DELETE `/posts/{id}`
/// Delete any post. There is no ownership check.
async fn delete_post(
    State(state): State<AppState>,
    auth: AuthUser,
    id: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state
        .posts
        .delete(Some(auth.user_id()), PostId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/posts/events`
/// Server-sent feed revisions; clients re-read `/posts` on each event.
async fn feed_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = WatchStream::new(state.posts.events().subscribe())
        .map(|revision| Ok(Event::default().event("feed").data(revision.to_string())));

    Sse::new(stream).keep_alive(KeepAlive::default())
}
