//! Tests for `loader` module

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::Arc;

use super::generator::ContentGenerator;
use super::loader::*;
use crate::error::Error;
use crate::model::{Content, ContentSize, SearchFilter};
use crate::store::{LogStore, MemoryLogStore};

// -------------------------------------------------------------------------
// BatchPlan
// -------------------------------------------------------------------------

#[test]
fn test_plan_last_batch_holds_remainder() {
    let plan = BatchPlan::new(2500, 1000).unwrap();
    let sizes: Vec<usize> = plan.iter().map(|b| b.size).collect();

    assert_eq!(plan.len(), 3);
    assert_eq!(sizes, vec![1000, 1000, 500]);
}

#[test]
fn test_plan_exact_multiple() {
    let plan = BatchPlan::new(3000, 1000).unwrap();

    assert_eq!(plan.len(), 3);
    assert!(plan.iter().all(|b| b.size == 1000));
}

#[test]
fn test_plan_empty() {
    let plan = BatchPlan::new(0, 1000).unwrap();

    assert!(plan.is_empty());
    assert_eq!(plan.iter().count(), 0);
}

#[test]
fn test_plan_rejects_zero_batch_size() {
    assert!(matches!(BatchPlan::new(10, 0), Err(Error::InvalidInput(_))));
}

proptest! {
    #[test]
    fn prop_plan_covers_total(total in 0usize..50_000, batch_size in 1usize..5000) {
        let plan = BatchPlan::new(total, batch_size).unwrap();
        let batches: Vec<_> = plan.iter().collect();

        prop_assert_eq!(batches.len(), total.div_ceil(batch_size));
        prop_assert_eq!(batches.iter().map(|b| b.size).sum::<usize>(), total);
        prop_assert!(batches.iter().all(|b| b.size >= 1 && b.size <= batch_size));
        prop_assert!(batches.iter().enumerate().all(|(i, b)| b.index == i));
        if let Some((last, full)) = batches.split_last() {
            prop_assert!(full.iter().all(|b| b.size == batch_size));
            prop_assert_eq!(last.size, total - full.len() * batch_size);
        }
    }
}

// -------------------------------------------------------------------------
// LoadReport
// -------------------------------------------------------------------------

#[test]
fn test_throughput() {
    let report = LoadReport {
        inserted: 1000,
        batches: 1,
        content_size: ContentSize::Small,
        elapsed: std::time::Duration::from_secs(2),
    };

    assert!((report.throughput() - 500.0).abs() < 0.001);
}

#[test]
fn test_throughput_zero_elapsed() {
    let report = LoadReport {
        inserted: 10,
        batches: 1,
        content_size: ContentSize::Small,
        elapsed: std::time::Duration::ZERO,
    };

    assert_eq!(report.throughput(), 0.0);
}

// -------------------------------------------------------------------------
// Batch contents
// -------------------------------------------------------------------------

#[test]
fn test_batch_shares_user_and_domain() {
    let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    let batch = BatchDescriptor { index: 0, size: 200 };

    let records = build_batch(&mut rng, &ContentGenerator::at(now), batch, ContentSize::Small, now);

    assert_eq!(records.len(), 200);
    assert_eq!(records.iter().map(|r| r.user_id).collect::<HashSet<_>>().len(), 1);
    assert_eq!(records.iter().map(|r| r.domain.as_str()).collect::<HashSet<_>>().len(), 1);
    assert_eq!(records.iter().map(|r| r.id).collect::<HashSet<_>>().len(), 200);
    assert!(records
        .iter()
        .all(|r| r.created_at <= now && r.created_at > now - Duration::days(30)));
}

// -------------------------------------------------------------------------
// BulkLoader
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_load_reports_accepted_rows() {
    let store = Arc::new(MemoryLogStore::new());
    let loader = BulkLoader::new(store.clone()).with_batch_size(300);

    let report = loader
        .load_with_rng(1000, ContentSize::Small, &mut StdRng::seed_from_u64(1))
        .await
        .unwrap();

    assert_eq!(report.inserted, 1000);
    assert_eq!(report.batches, 4);
    assert_eq!(store.len().await, 1000);
}

#[tokio::test]
async fn test_load_zero_records() {
    let store = Arc::new(MemoryLogStore::new());
    let report = BulkLoader::new(store.clone()).load(0, ContentSize::Small).await.unwrap();

    assert_eq!(report.inserted, 0);
    assert_eq!(report.batches, 0);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_failed_batch_aborts_and_keeps_earlier_batches() {
    let store = Arc::new(MemoryLogStore::failing_after(2));
    let loader = BulkLoader::new(store.clone()).with_batch_size(100);

    let err = loader.load(500, ContentSize::Small).await.unwrap_err();

    match err {
        Error::BatchFailed { batch, .. } => assert_eq!(batch, 2),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.len().await, 200);
}

#[tokio::test]
async fn test_record_fills_missing_user() {
    let store = Arc::new(MemoryLogStore::new());
    let loader = BulkLoader::new(store.clone());

    let mut content = Content::new();
    content.insert("path", "/logs");
    let record = loader.record("app.io", "GET", None, content).await.unwrap();

    assert!(!record.user_id.is_nil());
    let stored = store.list(&SearchFilter::default()).await.unwrap();
    assert_eq!(stored, vec![record]);
}
