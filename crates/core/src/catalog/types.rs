//! Catalog types and data structures.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use filegate_shared::FileId;
use filegate_shared::types::PageRequest;

use super::error::CatalogError;
use super::format::format_file_size;

/// Metadata for one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Public handle.
    pub id: FileId,
    /// Key of the bytes in the object store.
    pub storage_key: String,
    /// Filename as supplied by the client.
    pub original_name: String,
    /// Declared content type.
    pub mime_type: String,
    /// Size in bytes.
    pub size: u64,
    /// Free-form description.
    pub description: Option<String>,
    /// Tags.
    pub tags: Vec<String>,
    /// When the upload completed.
    pub uploaded_at: DateTime<Utc>,
    /// Last mutation.
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    /// Human-readable size, e.g. `1.5 KB`.
    #[must_use]
    pub fn formatted_size(&self) -> String {
        format_file_size(self.size)
    }

    /// Lowercased extension of the original name, empty when there is none.
    #[must_use]
    pub fn extension(&self) -> String {
        self.original_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default()
    }

    /// Whether the file is an image.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Whether the file is a PDF document.
    #[must_use]
    pub fn is_pdf(&self) -> bool {
        self.mime_type == "application/pdf"
    }

    /// Whether the file is plain text of some kind.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.mime_type.starts_with("text/")
    }

    /// Apply a metadata update and refresh `updated_at`.
    ///
    /// An empty description clears it.
    pub fn apply(&mut self, update: FileRecordUpdate, now: DateTime<Utc>) {
        if let Some(description) = update.description {
            self.description = (!description.is_empty()).then_some(description);
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        self.updated_at = now;
    }
}

/// Upload as handed over by the gateway.
#[derive(Debug, Clone)]
pub struct NewUpload {
    /// File bytes.
    pub content: Bytes,
    /// Declared size; must equal `content.len()`.
    pub size: u64,
    /// Declared content type.
    pub mime_type: String,
    /// Client filename.
    pub original_name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional comma-separated tags.
    pub tags: Option<String>,
}

impl NewUpload {
    /// Upload with no description or tags, size taken from the content.
    #[must_use]
    pub fn new(
        content: impl Into<Bytes>,
        mime_type: impl Into<String>,
        original_name: impl Into<String>,
    ) -> Self {
        let content = content.into();
        Self {
            size: u64::try_from(content.len()).unwrap_or(u64::MAX),
            content,
            mime_type: mime_type.into(),
            original_name: original_name.into(),
            description: None,
            tags: None,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the raw comma-separated tags.
    #[must_use]
    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }
}

/// A stored file together with a read URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// The record.
    pub record: FileRecord,
    /// Presigned read URL.
    pub url: String,
}

/// Field replacement applied by the record store. `None` keeps the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRecordUpdate {
    /// New description; empty clears it.
    pub description: Option<String>,
    /// New tag list.
    pub tags: Option<Vec<String>>,
}

/// Metadata change requested by a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataUpdate {
    /// New description; empty clears it.
    pub description: Option<String>,
    /// New comma-separated tags; empty clears them.
    pub tags: Option<String>,
}

/// Sortable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    /// Original filename, case-insensitive.
    FileName,
    /// Size in bytes.
    Size,
    /// Upload time.
    #[default]
    UploadedAt,
}

impl SortBy {
    /// Wire name of the field.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileName => "fileName",
            Self::Size => "size",
            Self::UploadedAt => "uploadedAt",
        }
    }
}

impl FromStr for SortBy {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fileName" => Ok(Self::FileName),
            "size" => Ok(Self::Size),
            "uploadedAt" => Ok(Self::UploadedAt),
            other => Err(CatalogError::validation(format!(
                "sortBy must be one of fileName, size, uploadedAt; got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Desc,
}

impl SortOrder {
    /// Wire name of the direction.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else {
            Err(CatalogError::validation(format!(
                "sortOrder must be ASC or DESC; got '{s}'"
            )))
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw query parameters as received by the gateway.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileQueryParams {
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub limit: Option<u32>,
    /// Case-insensitive substring of the original name.
    pub search: Option<String>,
    /// Sort field name.
    pub sort_by: Option<String>,
    /// Sort direction.
    pub sort_order: Option<String>,
    /// Exact MIME type.
    pub mime_type: Option<String>,
}

/// Validated query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileQuery {
    /// Trimmed, non-empty search needle.
    pub search: Option<String>,
    /// Exact MIME type filter.
    pub mime_type: Option<String>,
    /// Sort field.
    pub sort_by: SortBy,
    /// Sort direction of the primary key.
    pub sort_order: SortOrder,
    /// Page window.
    pub page: PageRequest,
}

impl FileQuery {
    /// Restrict to names containing `needle`.
    #[must_use]
    pub fn search(mut self, needle: impl Into<String>) -> Self {
        self.search = Some(needle.into());
        self
    }

    /// Restrict to one MIME type.
    #[must_use]
    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Set sort field and direction.
    #[must_use]
    pub fn sorted(mut self, sort_by: SortBy, sort_order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self
    }

    /// Set the page window.
    #[must_use]
    pub fn page(mut self, page: u32, limit: u32) -> Self {
        self.page = PageRequest { page, limit };
        self
    }
}

impl TryFrom<&FileQueryParams> for FileQuery {
    type Error = CatalogError;

    fn try_from(params: &FileQueryParams) -> Result<Self, Self::Error> {
        let page = PageRequest::new(params.page, params.limit)
            .map_err(|e| CatalogError::validation(e.to_string()))?;
        let sort_by = params
            .sort_by
            .as_deref()
            .map(str::parse::<SortBy>)
            .transpose()?
            .unwrap_or_default();
        let sort_order = params
            .sort_order
            .as_deref()
            .map(str::parse::<SortOrder>)
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            search: non_empty(params.search.as_deref()),
            mime_type: non_empty(params.mime_type.as_deref()),
            sort_by,
            sort_order,
            page,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// One page of records plus the filtered total.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryPage {
    /// Records in the requested window.
    pub records: Vec<FileRecord>,
    /// Number of records matching the filters, ignoring the window.
    pub total: u64,
}
