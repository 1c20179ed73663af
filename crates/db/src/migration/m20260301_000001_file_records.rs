//! File records migration.
//!
//! Creates the metadata table for uploaded files.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(FILE_RECORDS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS file_records CASCADE;")
            .await?;
        Ok(())
    }
}

const FILE_RECORDS_SQL: &str = r"
-- One row per successfully uploaded object
CREATE TABLE file_records (
    id UUID PRIMARY KEY,
    storage_key VARCHAR(512) NOT NULL,
    original_name VARCHAR(512) NOT NULL,
    mime_type VARCHAR(255) NOT NULL,
    size BIGINT NOT NULL,
    description VARCHAR(500),
    tags JSONB NOT NULL DEFAULT '[]'::jsonb,
    uploaded_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_file_records_storage_key UNIQUE (storage_key),
    CONSTRAINT chk_file_records_size CHECK (size >= 0),
    CONSTRAINT chk_file_records_tags CHECK (jsonb_typeof(tags) = 'array')
);

-- Case-insensitive name search and fileName ordering
CREATE INDEX idx_file_records_name_lower ON file_records (lower(original_name));

-- Default listing order
CREATE INDEX idx_file_records_uploaded ON file_records (uploaded_at DESC, id);

-- MIME type filter
CREATE INDEX idx_file_records_mime ON file_records (mime_type);
";
