//! Health check endpoints.

use axum::{Json, Router, routing::get};
use serde::Serialize;

use filegate_core::catalog::FileRecordStore;
use filegate_core::storage::ObjectStore;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// Health check handler.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Creates health check routes.
pub fn routes<S, R>() -> Router<AppState<S, R>>
where
    S: ObjectStore + 'static,
    R: FileRecordStore + 'static,
{
    Router::new().route("/health", get(health_check))
}
