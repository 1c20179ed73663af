//! API route definitions.

use axum::Router;
use axum::extract::DefaultBodyLimit;

use filegate_core::catalog::FileRecordStore;
use filegate_core::storage::ObjectStore;

use crate::AppState;

pub mod files;
pub mod health;
pub mod storage;

/// Room for multipart framing and text fields around the file itself.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

/// Creates the API router with all routes.
pub fn api_routes<S, R>(state: &AppState<S, R>) -> Router<AppState<S, R>>
where
    S: ObjectStore + 'static,
    R: FileRecordStore + 'static,
{
    let body_limit = state
        .catalog
        .config()
        .max_file_size
        .saturating_add(MULTIPART_OVERHEAD);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    Router::new()
        .merge(health::routes())
        .merge(files::routes().layer(DefaultBodyLimit::max(body_limit)))
        .merge(storage::routes())
}
