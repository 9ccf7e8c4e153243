//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth_middleware};

pub mod auth;
pub mod files;
pub mod health;
pub mod posts;
pub mod uploads;

/// Creates the API router with all routes.
///
/// Every route passes through the auth middleware; handlers that require a
/// user say so by extracting [`crate::middleware::AuthUser`].
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(uploads::routes())
        .merge(posts::routes())
        .merge(files::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
}
