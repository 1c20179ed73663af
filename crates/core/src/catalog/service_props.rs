//! Property tests for catalog queries.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;

use filegate_shared::FileId;

use super::service::tests::MockObjectStore;
use super::{
    CatalogConfig, FileCatalogService, FileQueryParams, FileRecord, FileRecordStore,
    InMemoryFileStore,
};

type Catalog = FileCatalogService<MockObjectStore, InMemoryFileStore>;

fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn records_strategy() -> impl Strategy<Value = Vec<(String, u64, i64)>> {
    prop::collection::vec(("[a-cA-C]{1,4}\\.png", 0u64..50, 0i64..5), 0..60)
}

fn sort_by_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("fileName".to_string())),
        Just(Some("size".to_string())),
        Just(Some("uploadedAt".to_string())),
    ]
}

fn sort_order_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("ASC".to_string())),
        Just(Some("desc".to_string())),
    ]
}

async fn seeded(rows: &[(String, u64, i64)]) -> Catalog {
    let store = InMemoryFileStore::new();
    for (i, (name, size, offset)) in rows.iter().enumerate() {
        let at = base_time() + Duration::seconds(*offset);
        store
            .insert(FileRecord {
                id: FileId::new(),
                storage_key: format!("{i}-{name}"),
                original_name: name.clone(),
                mime_type: "image/png".to_string(),
                size: *size,
                description: None,
                tags: vec![],
                uploaded_at: at,
                updated_at: at,
            })
            .await
            .unwrap();
    }
    FileCatalogService::new(
        Arc::new(MockObjectStore::default()),
        Arc::new(store),
        CatalogConfig::default(),
    )
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every page respects the limit and reports the same total.
    #[test]
    fn prop_page_bounds_and_total(
        rows in records_strategy(),
        page in 1u32..10,
        limit in 1u32..=100,
        sort_by in sort_by_strategy(),
        sort_order in sort_order_strategy(),
    ) {
        runtime().block_on(async {
            let catalog = seeded(&rows).await;
            let params = FileQueryParams {
                page: Some(page),
                limit: Some(limit),
                sort_by,
                sort_order,
                ..FileQueryParams::default()
            };
            let result = catalog.query_files(&params).await.unwrap();

            let total = rows.len() as u64;
            prop_assert!(result.data.len() <= limit as usize);
            prop_assert_eq!(result.pagination.total, total);
            prop_assert_eq!(result.pagination.total_pages, total.div_ceil(u64::from(limit)));

            if u64::from(page) > result.pagination.total_pages {
                prop_assert!(result.data.is_empty());
            }
            Ok(())
        })?;
    }

    /// Walking all pages yields every matching record exactly once.
    #[test]
    fn prop_pages_partition_results(
        rows in records_strategy(),
        limit in 1u32..15,
        search in prop::option::of("[a-c]"),
        sort_by in sort_by_strategy(),
        sort_order in sort_order_strategy(),
    ) {
        runtime().block_on(async {
            let catalog = seeded(&rows).await;
            let expected = rows
                .iter()
                .filter(|(name, _, _)| {
                    search
                        .as_ref()
                        .is_none_or(|s| name.to_lowercase().contains(s.as_str()))
                })
                .count();

            let mut seen = HashSet::new();
            let mut page = 1;
            loop {
                let params = FileQueryParams {
                    page: Some(page),
                    limit: Some(limit),
                    search: search.clone(),
                    sort_by: sort_by.clone(),
                    sort_order: sort_order.clone(),
                    ..FileQueryParams::default()
                };
                let result = catalog.query_files(&params).await.unwrap();
                prop_assert_eq!(result.pagination.total, expected as u64);
                if result.data.is_empty() {
                    break;
                }
                for record in result.data {
                    prop_assert!(seen.insert(record.id), "record returned twice");
                }
                page += 1;
            }
            prop_assert_eq!(seen.len(), expected);
            Ok(())
        })?;
    }

    /// Records equal on the sort field come back in ascending id order
    /// whatever the direction.
    #[test]
    fn prop_ties_ordered_by_id(
        count in 1usize..30,
        sort_order in sort_order_strategy(),
    ) {
        runtime().block_on(async {
            let rows: Vec<_> = (0..count).map(|_| ("same.png".to_string(), 7, 0)).collect();
            let catalog = seeded(&rows).await;

            for sort_by in ["fileName", "size", "uploadedAt"] {
                let params = FileQueryParams {
                    limit: Some(100),
                    sort_by: Some(sort_by.to_string()),
                    sort_order: sort_order.clone(),
                    ..FileQueryParams::default()
                };
                let result = catalog.query_files(&params).await.unwrap();
                let ids: Vec<FileId> = result.data.iter().map(|r| r.id).collect();
                let mut sorted = ids.clone();
                sorted.sort();
                prop_assert_eq!(ids, sorted);
            }
            Ok(())
        })?;
    }
}
