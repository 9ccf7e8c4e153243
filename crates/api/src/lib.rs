//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for uploads, posts and the feed
//! - Authentication middleware
//! - Error responses

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use corkboard_core::post::{FeedEvents, PostService};
use corkboard_core::storage::StorageService;
use corkboard_core::submission::SubmissionService;
use corkboard_db::{PostRepository, UserRepository};
use corkboard_shared::JwtService;

/// Post service backed by the database.
pub type Posts = PostService<PostRepository>;

/// Submission pipeline backed by the database and the blob store.
pub type Submissions = SubmissionService<PostRepository, StorageService>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, pinged by the health check.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token verification.
    pub jwt_service: Arc<JwtService>,
    /// Blob storage for uploaded files.
    pub storage: Arc<StorageService>,
    /// Post service.
    pub posts: Arc<Posts>,
    /// Submission pipeline.
    pub submissions: Arc<Submissions>,
    /// User records, for the identity integration.
    pub users: UserRepository,
}

impl AppState {
    /// Wire services around an open database handle.
    ///
    /// `query_timeout` bounds every post repository call. `owner_open_id`
    /// is promoted to admin when the identity integration upserts it.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        jwt_service: JwtService,
        storage: StorageService,
        query_timeout: Duration,
        owner_open_id: Option<String>,
    ) -> Self {
        let storage = Arc::new(storage);
        let posts = Arc::new(
            PostService::new(PostRepository::new(db.clone()), FeedEvents::new())
                .with_timeout(query_timeout),
        );
        let submissions = Arc::new(
            SubmissionService::new(posts.clone(), storage.clone())
                .with_put_timeout(storage.config().put_timeout),
        );
        let users = UserRepository::new(db.clone()).with_owner(owner_open_id);

        Self {
            db: Arc::new(db),
            jwt_service: Arc::new(jwt_service),
            storage,
            posts,
            submissions,
            users,
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
