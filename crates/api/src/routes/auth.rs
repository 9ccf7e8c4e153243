//! Session routes.
//!
//! Sign-in happens with the external identity provider; these routes only
//! report and end the current session.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::{AuthUser, SESSION_COOKIE};
use corkboard_db::entities::users;
use corkboard_shared::AppError;
use corkboard_shared::types::UserId;

/// Creates the session routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout))
}

/// The signed-in user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// User ID.
    pub id: UserId,
    /// External-auth identifier.
    pub open_id: String,
    /// Display name.
    pub name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// How the user signed in.
    pub login_method: Option<String>,
    /// `user` or `admin`.
    pub role: &'static str,
    /// Account creation (ISO 8601).
    pub created_at: String,
    /// Last sign-in (ISO 8601).
    pub last_signed_in: String,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: UserId::new(user.id),
            open_id: user.open_id,
            name: user.name,
            email: user.email,
            login_method: user.login_method,
            role: user.role.as_str(),
            created_at: user.created_at.to_rfc3339(),
            last_signed_in: user.last_signed_in.to_rfc3339(),
        }
    }
}

/// GET `/auth/me`
/// The current user, or `null` without a session.
async fn me(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
) -> Result<Json<Option<UserResponse>>, ApiError> {
    let Some(auth) = auth else {
        return Ok(Json(None));
    };

    let user = state
        .users
        .find_by_id(auth.user_id())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(user.map(UserResponse::from)))
}

/// POST `/auth/logout`
/// Clear the session cookie.
async fn logout(auth: Option<AuthUser>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    if let Some(auth) = auth {
        info!(user_id = %auth.user_id(), "User logged out");
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Json(json!({ "success": true })))
}
