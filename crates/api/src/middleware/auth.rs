//! Authentication middleware and extractor.
//!
//! The middleware never rejects a request on its own. It verifies whatever
//! token the request carries and leaves the outcome in the request
//! extensions; handlers that need a user take an [`AuthUser`], which turns a
//! missing or bad token into a 401.

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::debug;

use crate::AppState;
use crate::error::ApiError;
use corkboard_shared::types::UserId;
use corkboard_shared::{Claims, JwtError};

/// Cookie that carries the session token for browser clients.
pub const SESSION_COOKIE: &str = "app_session_id";

/// Why a request carries no verified claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthFailure {
    Missing,
    Expired,
    Invalid,
}

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

fn request_token(request: &Request) -> Option<String> {
    let bearer = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
        .map(str::to_string);

    bearer.or_else(|| {
        CookieJar::from_headers(request.headers())
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
    })
}

/// Verifies the request's token, if any.
///
/// The token is read from a `Bearer` Authorization header, falling back to
/// the session cookie. Valid claims are stored in the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let outcome = match request_token(&request) {
        None => Err(AuthFailure::Missing),
        Some(token) => state.jwt_service.verify(&token).map_err(|e| {
            debug!(error = %e, "Rejected access token");
            match e {
                JwtError::Expired => AuthFailure::Expired,
                _ => AuthFailure::Invalid,
            }
        }),
    };

    match outcome {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
        }
        Err(failure) => {
            request.extensions_mut().insert(failure);
        }
    }

    next.run(request).await
}

/// Extractor for authenticated user claims.
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> impl IntoResponse {
///     let user_id = auth.user_id();
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Returns the user ID from the claims.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.0.user_id()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<Claims>() {
            return Ok(AuthUser(claims.clone()));
        }

        let failure = parts
            .extensions
            .get::<AuthFailure>()
            .copied()
            .unwrap_or(AuthFailure::Missing);

        Err(match failure {
            AuthFailure::Missing => ApiError::unauthorized(
                "missing_token",
                "Authorization header with Bearer token is required",
            ),
            AuthFailure::Expired => ApiError::unauthorized("token_expired", "Token has expired"),
            AuthFailure::Invalid => {
                ApiError::unauthorized("invalid_token", "Invalid or malformed token")
            }
        })
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<Claims>().cloned().map(AuthUser))
    }
}
