//! Raw object listing for operators.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    routing::get,
};
use serde::Deserialize;

use filegate_core::catalog::FileRecordStore;
use filegate_core::storage::{ObjectInfo, ObjectStore};

use super::files::DataResponse;
use crate::{AppState, error::ApiError};

/// Creates the storage routes.
pub fn routes<S, R>() -> Router<AppState<S, R>>
where
    S: ObjectStore + 'static,
    R: FileRecordStore + 'static,
{
    Router::new().route("/storage/objects", get(list_objects::<S, R>))
}

/// Query parameters for the object listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListObjectsParams {
    /// Key prefix; everything when absent.
    #[serde(default)]
    pub prefix: String,
}

/// GET `/storage/objects`
async fn list_objects<S, R>(
    State(state): State<AppState<S, R>>,
    params: Result<Query<ListObjectsParams>, QueryRejection>,
) -> Result<Json<DataResponse<Vec<ObjectInfo>>>, ApiError>
where
    S: ObjectStore + 'static,
    R: FileRecordStore + 'static,
{
    let Query(params) = params?;
    let objects = state.catalog.list_objects(&params.prefix).await?;
    Ok(Json(DataResponse::new("Objects retrieved successfully", objects)))
}
