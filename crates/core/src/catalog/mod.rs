//! File catalog: metadata records over an object store.
//!
//! This module provides:
//! - Upload with collision-resistant storage keys
//! - Query with search, MIME filter, sorting and pagination
//! - Presigned URL minting by public file id
//! - Metadata updates and deletion that never let records and bytes diverge

mod error;
mod format;
mod locks;
mod query;
mod service;
mod store;
mod types;

#[cfg(test)]
mod service_props;

pub use error::CatalogError;
pub use format::{format_file_size, parse_tags};
pub use query::{compare_records, matches_filters, run_query};
pub use service::{CatalogConfig, FileCatalogService};
pub use store::{FileRecordStore, InMemoryFileStore};
pub use types::{
    FileQuery, FileQueryParams, FileRecord, FileRecordUpdate, MetadataUpdate, NewUpload,
    QueryPage, SortBy, SortOrder, UploadedFile,
};
