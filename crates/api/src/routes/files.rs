//! File catalog routes.

use axum::{
    Json, Router,
    extract::{
        Multipart, Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use filegate_core::catalog::{
    FileQueryParams, FileRecord, FileRecordStore, MetadataUpdate, NewUpload,
};
use filegate_core::storage::ObjectStore;
use filegate_shared::FileId;
use filegate_shared::types::PageMeta;

use crate::{AppState, error::ApiError};

/// Creates the file routes.
pub fn routes<S, R>() -> Router<AppState<S, R>>
where
    S: ObjectStore + 'static,
    R: FileRecordStore + 'static,
{
    Router::new()
        .route("/files/upload", post(upload_file::<S, R>))
        .route("/files", get(list_files::<S, R>))
        .route(
            "/files/{id}",
            get(get_file::<S, R>)
                .patch(update_file::<S, R>)
                .delete(delete_file::<S, R>),
        )
        .route("/files/{id}/url", get(get_file_url::<S, R>))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// File as returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    /// Public id.
    pub id: FileId,
    /// Name of the object in storage.
    pub file_name: String,
    /// Name the client uploaded.
    pub original_name: String,
    /// Content type.
    pub mime_type: String,
    /// Size in bytes.
    pub size: u64,
    /// Size for display, e.g. `1.5 KB`.
    pub formatted_size: String,
    /// Lowercased extension of the original name, empty when there is none.
    pub extension: String,
    /// Image content type.
    pub is_image: bool,
    /// PDF document.
    pub is_pdf: bool,
    /// Text content type.
    pub is_text: bool,
    /// Read URL, when one was minted for this response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Upload time.
    pub uploaded_at: DateTime<Utc>,
    /// Last metadata change.
    pub updated_at: DateTime<Utc>,
}

impl FileResponse {
    fn new(record: FileRecord, url: Option<String>) -> Self {
        Self {
            id: record.id,
            formatted_size: record.formatted_size(),
            extension: record.extension(),
            is_image: record.is_image(),
            is_pdf: record.is_pdf(),
            is_text: record.is_text(),
            file_name: record.storage_key,
            original_name: record.original_name,
            mime_type: record.mime_type,
            size: record.size,
            url,
            description: record.description,
            tags: record.tags,
            uploaded_at: record.uploaded_at,
            updated_at: record.updated_at,
        }
    }
}

/// Response for a completed upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Success message.
    pub message: &'static str,
    /// Stored file.
    pub file: FileResponse,
}

/// Envelope for single-item responses.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    /// Always `true`.
    pub success: bool,
    /// Success message.
    pub message: &'static str,
    /// Payload.
    pub data: T,
}

impl<T> DataResponse<T> {
    pub(crate) fn new(message: &'static str, data: T) -> Self {
        Self {
            success: true,
            message,
            data,
        }
    }
}

/// Envelope for a page of files.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    /// Always `true`.
    pub success: bool,
    /// Success message.
    pub message: &'static str,
    /// Files on this page.
    pub data: Vec<FileResponse>,
    /// Page position and totals.
    pub pagination: PageMeta,
}

/// Acknowledgement without payload.
#[derive(Debug, Serialize)]
pub struct AckResponse {
    /// Always `true`.
    pub success: bool,
    /// Success message.
    pub message: &'static str,
}

/// Query parameters for minting a URL.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlParams {
    /// Lifetime in seconds.
    pub expires_in: Option<u64>,
}

/// Minted URL.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlResponse {
    /// Read URL.
    pub url: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
}

fn parse_id(raw: &str) -> Result<FileId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::validation(format!("'{raw}' is not a valid file id")))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/files/upload`
/// Multipart upload with a `file` part and optional `description` and `tags`.
async fn upload_file<S, R>(
    State(state): State<AppState<S, R>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError>
where
    S: ObjectStore + 'static,
    R: FileRecordStore + 'static,
{
    let mut upload: Option<NewUpload> = None;
    let mut description = None;
    let mut tags = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let original_name = field.file_name().unwrap_or_default().to_owned();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_owned();
                let content = field.bytes().await?;
                upload = Some(NewUpload::new(content, mime_type, original_name));
            }
            Some("description") => description = Some(field.text().await?),
            Some("tags") => tags = Some(field.text().await?),
            _ => {}
        }
    }

    let Some(mut upload) = upload else {
        return Err(ApiError::validation("No file uploaded"));
    };
    upload.description = description.filter(|d| !d.is_empty());
    upload.tags = tags;

    let uploaded = state.catalog.upload(upload).await?;
    info!(file_id = %uploaded.record.id, "Upload accepted");

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "File uploaded successfully",
            file: FileResponse::new(uploaded.record, Some(uploaded.url)),
        }),
    ))
}

/// GET `/files`
/// Search, filter, sort and paginate file records.
async fn list_files<S, R>(
    State(state): State<AppState<S, R>>,
    params: Result<Query<FileQueryParams>, QueryRejection>,
) -> Result<Json<ListResponse>, ApiError>
where
    S: ObjectStore + 'static,
    R: FileRecordStore + 'static,
{
    let Query(params) = params?;
    let page = state.catalog.query_files(&params).await?;
    let page = page.map(|record| FileResponse::new(record, None));

    Ok(Json(ListResponse {
        success: true,
        message: "Files retrieved successfully",
        data: page.data,
        pagination: page.pagination,
    }))
}

/// GET `/files/{id}`
/// One record with a fresh read URL.
async fn get_file<S, R>(
    State(state): State<AppState<S, R>>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<FileResponse>>, ApiError>
where
    S: ObjectStore + 'static,
    R: FileRecordStore + 'static,
{
    let id = parse_id(&id)?;
    let file = state.catalog.get_file_with_url(id, None).await?;

    Ok(Json(DataResponse::new(
        "File retrieved successfully",
        FileResponse::new(file.record, Some(file.url)),
    )))
}

/// GET `/files/{id}/url`
/// Mint a read URL, optionally with `?expiresIn=` seconds.
async fn get_file_url<S, R>(
    State(state): State<AppState<S, R>>,
    Path(id): Path<String>,
    params: Result<Query<UrlParams>, QueryRejection>,
) -> Result<Json<UrlResponse>, ApiError>
where
    S: ObjectStore + 'static,
    R: FileRecordStore + 'static,
{
    let id = parse_id(&id)?;
    let Query(params) = params?;
    let expires_in = params
        .expires_in
        .unwrap_or(state.catalog.config().default_url_ttl_secs);
    let url = state.catalog.get_file_url(id, Some(expires_in)).await?;

    Ok(Json(UrlResponse { url, expires_in }))
}

/// PATCH `/files/{id}`
/// Replace description and/or tags.
async fn update_file<S, R>(
    State(state): State<AppState<S, R>>,
    Path(id): Path<String>,
    payload: Result<Json<MetadataUpdate>, JsonRejection>,
) -> Result<Json<DataResponse<FileResponse>>, ApiError>
where
    S: ObjectStore + 'static,
    R: FileRecordStore + 'static,
{
    let id = parse_id(&id)?;
    let Json(update) = payload?;
    let record = state.catalog.update_metadata(id, update).await?;

    Ok(Json(DataResponse::new(
        "File updated successfully",
        FileResponse::new(record, None),
    )))
}

/// DELETE `/files/{id}`
/// Remove the object and then its record.
async fn delete_file<S, R>(
    State(state): State<AppState<S, R>>,
    Path(id): Path<String>,
) -> Result<Json<AckResponse>, ApiError>
where
    S: ObjectStore + 'static,
    R: FileRecordStore + 'static,
{
    let id = parse_id(&id)?;
    state.catalog.delete_file(id).await?;

    Ok(Json(AckResponse {
        success: true,
        message: "File deleted successfully",
    }))
}
