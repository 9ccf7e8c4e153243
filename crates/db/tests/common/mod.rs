//! Shared helpers for repository integration tests.

use corkboard_db::migration::{Migrator, MigratorTrait};
use corkboard_db::{UpsertUser, UserRepository};
use corkboard_shared::config::DatabaseConfig;
use corkboard_shared::types::UserId;
use sea_orm::DatabaseConnection;

/// Fresh in-memory database with all migrations applied.
///
/// A single pooled connection keeps the in-memory database alive.
pub async fn test_db() -> DatabaseConnection {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        query_timeout_secs: 10,
    };
    let db = corkboard_db::connect(&config)
        .await
        .expect("Failed to connect to database");
    Migrator::up(&db, None).await.expect("Failed to migrate");
    db
}

/// Insert a user with a display name and return its id.
#[allow(dead_code)]
pub async fn seed_user(db: &DatabaseConnection, open_id: &str, name: &str) -> UserId {
    let user = UserRepository::new(db.clone())
        .upsert(UpsertUser {
            open_id: open_id.to_string(),
            name: Some(name.to_string()),
            ..Default::default()
        })
        .await
        .expect("Failed to seed user");
    UserId::new(user.id)
}
