//! File record repository for database operations.
//!
//! Implements the catalog's record store on PostgreSQL using SeaORM.

use chrono::Utc;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    Order, PaginatorTrait, QueryFilter, QueryOrder, Select, Set, SqlErr,
};
use tracing::debug;

use filegate_core::catalog::{
    CatalogError, FileQuery, FileRecord, FileRecordStore, FileRecordUpdate, QueryPage, SortBy,
    SortOrder,
};
use filegate_shared::FileId;

use crate::entities::file_records;

/// PostgreSQL-backed file record store.
#[derive(Debug, Clone)]
pub struct FileRecordRepository {
    db: DatabaseConnection,
}

impl FileRecordRepository {
    /// Create a new file record repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find(&self, id: FileId) -> Result<Option<file_records::Model>, CatalogError> {
        file_records::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(repo_err)
    }
}

impl FileRecordStore for FileRecordRepository {
    async fn insert(&self, record: FileRecord) -> Result<FileRecord, CatalogError> {
        let size = i64::try_from(record.size)
            .map_err(|_| CatalogError::validation(format!("size {} out of range", record.size)))?;

        let active_model = file_records::ActiveModel {
            id: Set(record.id.into_inner()),
            storage_key: Set(record.storage_key.clone()),
            original_name: Set(record.original_name.clone()),
            mime_type: Set(record.mime_type.clone()),
            size: Set(size),
            description: Set(record.description.clone()),
            tags: Set(tags_to_json(&record.tags)),
            uploaded_at: Set(record.uploaded_at.into()),
            updated_at: Set(record.updated_at.into()),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| insert_err(&e, &record))?;

        Ok(to_domain(model))
    }

    async fn get_by_id(&self, id: FileId) -> Result<Option<FileRecord>, CatalogError> {
        Ok(self.find(id).await?.map(to_domain))
    }

    async fn query(&self, query: &FileQuery) -> Result<QueryPage, CatalogError> {
        let paginator = filtered(query).paginate(&self.db, query.page.limit());

        let total = paginator.num_items().await.map_err(repo_err)?;
        let models = paginator
            .fetch_page(u64::from(query.page.page.saturating_sub(1)))
            .await
            .map_err(repo_err)?;

        debug!(total, returned = models.len(), "Queried file records");

        Ok(QueryPage {
            records: models.into_iter().map(to_domain).collect(),
            total,
        })
    }

    async fn delete_by_id(&self, id: FileId) -> Result<FileRecord, CatalogError> {
        let model = self.find(id).await?.ok_or(CatalogError::NotFound(id))?;

        let result = file_records::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(repo_err)?;

        if result.rows_affected == 0 {
            return Err(CatalogError::NotFound(id));
        }

        Ok(to_domain(model))
    }

    async fn update(
        &self,
        id: FileId,
        update: FileRecordUpdate,
    ) -> Result<FileRecord, CatalogError> {
        let model = self.find(id).await?.ok_or(CatalogError::NotFound(id))?;

        let mut record = to_domain(model.clone());
        record.apply(update, Utc::now());

        let mut active_model = model.into_active_model();
        active_model.description = Set(record.description.clone());
        active_model.tags = Set(tags_to_json(&record.tags));
        active_model.updated_at = Set(record.updated_at.into());

        let model = active_model.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => CatalogError::NotFound(id),
            other => repo_err(other),
        })?;

        Ok(to_domain(model))
    }
}

/// Apply search, MIME filter and ordering; ties fall back to id ascending.
fn filtered(query: &FileQuery) -> Select<file_records::Entity> {
    let mut select = file_records::Entity::find();

    if let Some(search) = &query.search {
        let pattern = format!("%{}%", escape_like(search));
        select = select.filter(
            Expr::col((file_records::Entity, file_records::Column::OriginalName)).ilike(pattern),
        );
    }

    if let Some(mime_type) = &query.mime_type {
        select = select.filter(file_records::Column::MimeType.eq(mime_type.as_str()));
    }

    let order = match query.sort_order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    };

    let primary: SimpleExpr = match query.sort_by {
        SortBy::FileName => Func::lower(Expr::col((
            file_records::Entity,
            file_records::Column::OriginalName,
        )))
        .into(),
        SortBy::Size => Expr::col((file_records::Entity, file_records::Column::Size)).into(),
        SortBy::UploadedAt => {
            Expr::col((file_records::Entity, file_records::Column::UploadedAt)).into()
        }
    };

    select
        .order_by(primary, order)
        .order_by_asc(file_records::Column::Id)
}

/// Escape LIKE metacharacters so the needle matches literally.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn insert_err(err: &DbErr, record: &FileRecord) -> CatalogError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) if detail.contains("storage_key") => {
            CatalogError::DuplicateStorageKey(record.storage_key.clone())
        }
        Some(SqlErr::UniqueConstraintViolation(_)) => CatalogError::DuplicateId(record.id),
        _ => CatalogError::repository(err.to_string()),
    }
}

#[allow(clippy::needless_pass_by_value)]
fn repo_err(err: DbErr) -> CatalogError {
    CatalogError::repository(err.to_string())
}

fn tags_to_json(tags: &[String]) -> serde_json::Value {
    serde_json::Value::from(tags.to_vec())
}

/// Convert database model to domain model.
fn to_domain(model: file_records::Model) -> FileRecord {
    FileRecord {
        id: FileId::from_uuid(model.id),
        storage_key: model.storage_key,
        original_name: model.original_name,
        mime_type: model.mime_type,
        // CHECK (size >= 0) holds for every stored row
        size: u64::try_from(model.size).unwrap_or(0),
        description: model.description,
        tags: serde_json::from_value(model.tags).unwrap_or_default(),
        uploaded_at: model.uploaded_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
