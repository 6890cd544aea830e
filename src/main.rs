use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use attendance_api_rust::config::{self, StorageBackend};
use attendance_api_rust::database::{DatabaseManager, MemoryStore, PgStore, Store};
use attendance_api_rust::{app, is_production, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECURITY_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("attendance_api_rust=info,tower_http=info")),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting Attendance API in {:?} mode", config.environment);
    anyhow::ensure!(
        !config.security.jwt_secret.is_empty(),
        "SECURITY_JWT_SECRET must be set outside development"
    );

    let store: Arc<dyn Store> = match config.storage.backend {
        StorageBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database)?;
            DatabaseManager::migrate(&pool).await?;
            Arc::new(PgStore::new(pool)?)
        }
        StorageBackend::Memory => {
            if is_production!() {
                tracing::warn!("Memory storage selected in production; data will not survive a restart");
            }
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::new(store, config.clone());
    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Attendance API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}
