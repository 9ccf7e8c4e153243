//! Corkboard API Server
//!
//! Main entry point for the Corkboard backend service.

use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use corkboard_api::{AppState, create_router};
use corkboard_core::storage::{StorageConfig, StorageService};
use corkboard_db::connect;
use corkboard_db::migration::{Migrator, MigratorTrait};
use corkboard_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json");
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "corkboard=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Connect to database
    let db = connect(&config.database).await?;
    info!("Connected to database");

    if std::env::var("RUN_MIGRATIONS").is_ok_and(|flag| flag == "1" || flag == "true") {
        Migrator::up(&db, None).await?;
        info!("Migrations applied");
    }

    // Create JWT service
    let jwt_service = JwtService::new(JwtConfig::from(&config.jwt));

    // Create blob storage
    let storage = StorageService::from_config(StorageConfig::from(config.storage.clone()))?;
    info!(
        provider = storage.provider_name(),
        public_base_url = %storage.config().public_base_url,
        "Storage configured"
    );

    let state = AppState::new(
        db.clone(),
        jwt_service,
        storage,
        Duration::from_secs(config.database.query_timeout_secs),
        config.auth.owner_open_id.clone(),
    );

    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await?;
    info!("Database connection closed");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut signal) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            signal.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
