//! Liveness check for load balancers and the deploy pipeline.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use tracing::warn;

use crate::AppState;

/// What the service can reach right now.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// `healthy`, or `degraded` when the database does not answer.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// `up` or `down`.
    pub database: &'static str,
    /// Configured blob storage provider.
    pub storage: &'static str,
}

/// GET `/health`
/// 200 while the database answers a ping, 503 otherwise.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let database_up = match state.db.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Database ping failed");
            false
        }
    };

    let (code, status, database) = if database_up {
        (StatusCode::OK, "healthy", "up")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "down")
    };

    (
        code,
        Json(HealthReport {
            status,
            version: env!("CARGO_PKG_VERSION"),
            database,
            storage: state.storage.provider_name(),
        }),
    )
}

/// Creates the health route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
