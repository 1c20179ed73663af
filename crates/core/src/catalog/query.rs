//! Filter, sort and paginate over file records.
//!
//! The in-memory store runs these directly; persistent stores translate the
//! same semantics into their query language.

use std::cmp::Ordering;

use super::types::{FileQuery, FileRecord, QueryPage, SortBy, SortOrder};

/// Whether a record passes the search and MIME filters of `query`.
#[must_use]
pub fn matches_filters(record: &FileRecord, query: &FileQuery) -> bool {
    if let Some(needle) = &query.search {
        if !record
            .original_name
            .to_lowercase()
            .contains(&needle.to_lowercase())
        {
            return false;
        }
    }

    if let Some(mime_type) = &query.mime_type {
        if record.mime_type != *mime_type {
            return false;
        }
    }

    true
}

/// Order two records by `sort_by` in `sort_order`, then by id ascending.
///
/// The id tiebreak ignores the requested direction.
#[must_use]
pub fn compare_records(
    a: &FileRecord,
    b: &FileRecord,
    sort_by: SortBy,
    sort_order: SortOrder,
) -> Ordering {
    let primary = match sort_by {
        SortBy::FileName => a
            .original_name
            .to_lowercase()
            .cmp(&b.original_name.to_lowercase()),
        SortBy::Size => a.size.cmp(&b.size),
        SortBy::UploadedAt => a.uploaded_at.cmp(&b.uploaded_at),
    };

    let primary = match sort_order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };

    primary.then_with(|| a.id.cmp(&b.id))
}

/// Run a validated query over a set of records.
pub fn run_query<'a>(
    records: impl IntoIterator<Item = &'a FileRecord>,
    query: &FileQuery,
) -> QueryPage {
    let mut matched: Vec<&FileRecord> = records
        .into_iter()
        .filter(|record| matches_filters(record, query))
        .collect();

    matched.sort_by(|a, b| compare_records(a, b, query.sort_by, query.sort_order));

    let total = u64::try_from(matched.len()).unwrap_or(u64::MAX);
    let offset = usize::try_from(query.page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(query.page.limit()).unwrap_or(usize::MAX);

    let records = matched
        .into_iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect();

    QueryPage { records, total }
}
