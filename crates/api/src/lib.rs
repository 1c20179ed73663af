//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST routes over the file catalog
//! - JSON error responses
//! - Response types

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use filegate_core::catalog::{FileCatalogService, FileRecordStore};
use filegate_core::storage::ObjectStore;
use filegate_shared::ServerConfig;

pub use error::ApiError;

/// Application state shared across handlers.
pub struct AppState<S: ObjectStore, R: FileRecordStore> {
    /// File catalog over the configured object and record stores.
    pub catalog: Arc<FileCatalogService<S, R>>,
}

impl<S: ObjectStore, R: FileRecordStore> AppState<S, R> {
    /// Wrap a catalog service.
    #[must_use]
    pub fn new(catalog: FileCatalogService<S, R>) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }
}

impl<S: ObjectStore, R: FileRecordStore> Clone for AppState<S, R> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
        }
    }
}

/// Creates the main application router.
pub fn create_router<S, R>(state: AppState<S, R>, server: &ServerConfig) -> Router
where
    S: ObjectStore + 'static,
    R: FileRecordStore + 'static,
{
    Router::new()
        .nest("/api/v1", routes::api_routes(&state))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&server.cors_origins))
        .with_state(state)
}

/// Any origin when none are configured; otherwise exactly the listed ones.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(parsed)
}
