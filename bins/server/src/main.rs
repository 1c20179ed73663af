//! Filegate API Server
//!
//! Main entry point for the file-storage gateway.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use filegate_api::{AppState, create_router};
use filegate_core::catalog::{CatalogConfig, FileCatalogService, FileRecordStore, InMemoryFileStore};
use filegate_core::storage::{StorageConfig, StorageService};
use filegate_db::{FileRecordRepository, connect_with};
use filegate_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "filegate=debug,filegate_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    let storage_config = StorageConfig::try_from(&config.storage)?;
    let storage = StorageService::from_config(storage_config)?;
    storage.ensure_container().await?;
    info!(
        provider = storage.provider_name(),
        bucket = storage.bucket(),
        "Storage configured"
    );
    let storage = Arc::new(storage);

    match &config.database {
        Some(database) => {
            let db = connect_with(database).await?;
            info!("Connected to database");
            serve(&config, storage, Arc::new(FileRecordRepository::new(db))).await
        }
        None => {
            warn!("No database configured; file records are kept in memory only");
            serve(&config, storage, Arc::new(InMemoryFileStore::new())).await
        }
    }
}

async fn serve<R>(config: &AppConfig, storage: Arc<StorageService>, store: Arc<R>) -> anyhow::Result<()>
where
    R: FileRecordStore + 'static,
{
    let catalog = FileCatalogService::new(storage, store, CatalogConfig::from(config));
    let app = create_router(AppState::new(catalog), &config.server);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
