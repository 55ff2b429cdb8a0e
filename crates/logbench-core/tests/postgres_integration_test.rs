//! Integration tests against a live PostgreSQL.
//!
//! These tests require `LOGBENCH_TEST_DATABASE_URL` to point at a disposable
//! database; they create the schema and truncate the `logs` table.
//!
//! Run with: `cargo test -p logbench-core --test postgres_integration_test -- --ignored --test-threads=1`

#![allow(clippy::pedantic)]

use logbench_core::bench::{Harness, SeedPlan};
use logbench_core::config::{BenchConfig, DatabaseConfig};
use logbench_core::loader::BulkLoader;
use logbench_core::model::{Content, ContentSize, SearchFilter};
use logbench_core::query::QueryEngine;
use logbench_core::store::{self, LogStore};
use std::env;
use std::sync::Arc;

/// Connects with schema bootstrap, or `None` when the env var is unset.
async fn test_store() -> Option<Arc<dyn LogStore>> {
    let Ok(url) = env::var("LOGBENCH_TEST_DATABASE_URL") else {
        eprintln!("Skipping: LOGBENCH_TEST_DATABASE_URL not set");
        return None;
    };
    let config = DatabaseConfig {
        url,
        max_connections: 4,
        bootstrap_schema: true,
        ..DatabaseConfig::default()
    };
    let store = store::connect(&config).await.expect("connect");
    store.truncate().await.expect("truncate");
    Some(store)
}

#[tokio::test]
#[ignore]
async fn test_copy_load_and_count() {
    let Some(store) = test_store().await else {
        return;
    };

    let report = BulkLoader::new(Arc::clone(&store))
        .load(2500, ContentSize::Medium)
        .await
        .expect("load");

    assert_eq!(report.inserted, 2500);
    assert_eq!(report.batches, 3);
    assert_eq!(store.count(&SearchFilter::default()).await.unwrap(), 2500);
}

#[tokio::test]
#[ignore]
async fn test_large_multibyte_content_round_trips() {
    let Some(store) = test_store().await else {
        return;
    };

    BulkLoader::new(Arc::clone(&store))
        .load(20, ContentSize::Large)
        .await
        .expect("load");

    let rows = store.list(&SearchFilter::with_limit(20)).await.unwrap();
    assert_eq!(rows.len(), 20);
    assert!(rows.iter().all(|r| r.content.get("raw").is_none()));
    assert!(rows.iter().all(|r| r.content.get("nested_obj_99").is_some()));
}

#[tokio::test]
#[ignore]
async fn test_full_text_and_partial_agree_on_count_and_list() {
    let Some(store) = test_store().await else {
        return;
    };
    BulkLoader::new(Arc::clone(&store))
        .load(1000, ContentSize::Small)
        .await
        .expect("load");
    let engine = QueryEngine::new(Arc::clone(&store));

    for filter in [
        SearchFilter::default().full_text("login"),
        SearchFilter::default().partial("login"),
        SearchFilter::default().partial("50%_not_a_wildcard"),
    ] {
        let count = engine.count(&filter).await.unwrap();
        let rows = engine
            .list(&filter.first_page(u32::try_from(count.max(1)).unwrap()))
            .await
            .unwrap();
        assert_eq!(rows.len() as u64, count);
    }
}

#[tokio::test]
#[ignore]
async fn test_single_insert_is_listed_first() {
    let Some(store) = test_store().await else {
        return;
    };
    let loader = BulkLoader::new(Arc::clone(&store));
    loader.load(100, ContentSize::Small).await.expect("load");

    let mut content = Content::new();
    content.insert("path", "/api/logs");
    let record = loader.record("app.io", "GET", None, content).await.unwrap();

    let newest = store.list(&SearchFilter::with_limit(1)).await.unwrap();
    assert_eq!(newest[0].id, record.id);
}

#[tokio::test]
#[ignore]
async fn test_benchmark_matrix_completes() {
    let Some(store) = test_store().await else {
        return;
    };

    let run = Harness::new(store, BenchConfig::default())
        .with_seed(SeedPlan {
            count: 1000,
            content_size: ContentSize::Small,
            truncate: true,
        })
        .run()
        .await
        .expect("bench");

    assert_eq!(run.results.len(), 10);
    assert!(run
        .results
        .iter()
        .filter(|r| r.case.name.ends_with("Not Found"))
        .all(|r| r.rows == 0));
}
