//! End-to-end scenarios against the in-memory store.
//!
//! Each scenario drives the public API the way the CLI does: load, list,
//! search, benchmark.

#![allow(clippy::pedantic)]

use logbench_core::api::{InitializeRequest, LogQuery, LogService};
use logbench_core::bench::{Harness, SeedPlan};
use logbench_core::config::{BenchConfig, LogbenchConfig};
use logbench_core::loader::BulkLoader;
use logbench_core::model::{ContentSize, SearchFilter, SearchMode};
use logbench_core::query::QueryEngine;
use logbench_core::store::{LogStore, MemoryLogStore};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::Arc;

fn memory_store() -> Arc<dyn LogStore> {
    Arc::new(MemoryLogStore::new())
}

async fn seeded(total: usize, seed: u64) -> Arc<dyn LogStore> {
    let store = memory_store();
    BulkLoader::new(Arc::clone(&store))
        .load_with_rng(total, ContentSize::Small, &mut StdRng::seed_from_u64(seed))
        .await
        .expect("load");
    store
}

#[tokio::test]
async fn test_truncate_initialize_list_partial() {
    let service = LogService::new(memory_store(), &LogbenchConfig::default());

    service.truncate().await.unwrap();
    service
        .initialize(&InitializeRequest {
            record_count: 1000,
            content_size: "small".to_string(),
        })
        .await
        .unwrap();

    let all = service.list_logs(&LogQuery::default()).await.unwrap();
    assert_eq!(all.total, 1000);

    let login = service
        .search_partial(&LogQuery {
            search_term: Some("login".to_string()),
            limit: Some(1000),
            ..LogQuery::default()
        })
        .await
        .unwrap();

    assert!(login.total > 0);
    assert_eq!(login.data.len() as u64, login.total);
    assert!(login
        .data
        .iter()
        .all(|r| r.content.to_text().to_lowercase().contains("login")));
}

#[tokio::test]
async fn test_domain_filter_returns_only_that_domain() {
    let store = memory_store();
    let loader = BulkLoader::new(Arc::clone(&store)).with_batch_size(100);
    let engine = QueryEngine::new(Arc::clone(&store));

    // two batches, one domain each; retry seeds until the domains differ
    let mut seed = 0;
    let (first, second) = loop {
        store.truncate().await.unwrap();
        loader
            .load_with_rng(200, ContentSize::Small, &mut StdRng::seed_from_u64(seed))
            .await
            .unwrap();
        let domains: Vec<String> = engine
            .list(&SearchFilter::with_limit(200))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.domain)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        if domains.len() == 2 {
            break (domains[0].clone(), domains[1].clone());
        }
        seed += 1;
    };

    for domain in [first, second] {
        let filter = SearchFilter::with_limit(1000).domain(domain.clone());
        let count = engine.count(&filter).await.unwrap();
        let rows = engine.list(&filter).await.unwrap();

        assert_eq!(count, 100);
        assert_eq!(rows.len() as u64, count);
        assert!(rows.iter().all(|r| r.domain == domain));
    }
}

#[tokio::test]
async fn test_count_matches_list_len_for_each_mode() {
    let engine = QueryEngine::new(seeded(500, 7).await);

    for mode in [SearchMode::FullText, SearchMode::Partial] {
        let filter = SearchFilter::default().matching(mode, "success");
        let count = engine.count(&filter).await.unwrap();
        let limit = u32::try_from(count.max(1)).unwrap();
        let rows = engine.list(&filter.first_page(limit)).await.unwrap();

        assert_eq!(rows.len() as u64, count, "mode {mode}");
    }
}

#[tokio::test]
async fn test_search_reports_pagination() {
    let engine = QueryEngine::new(seeded(130, 3).await);

    let page = engine.search(&SearchFilter::default().page(3, 50)).await.unwrap();

    assert_eq!(page.total, 130);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.records.len(), 30);
}

#[tokio::test]
async fn test_bench_on_fresh_small_dataset() {
    let store = memory_store();
    let harness = Harness::new(Arc::clone(&store), BenchConfig::default()).with_seed(SeedPlan {
        count: 1000,
        content_size: ContentSize::Small,
        truncate: true,
    });

    let run = harness.run_with_rng(&mut StdRng::seed_from_u64(11)).await.unwrap();

    assert_eq!(run.dataset_size, 1000);
    assert_eq!(run.results.len(), 10);
    assert!(run.skipped.is_empty());
    for result in run.results.iter().filter(|r| r.case.name.ends_with("Not Found")) {
        assert_eq!(result.rows, 0, "{}", result.case.name);
    }
    let uncapped = run
        .results
        .iter()
        .find(|r| r.case.name == "Partial Common (Many) NoLimit")
        .unwrap();
    assert_eq!(uncapped.case.limit_label(), "ALL");
    assert!(run.seed.is_some());
}

#[tokio::test]
async fn test_bench_on_empty_dataset_uses_fallback_terms() {
    let run = Harness::new(memory_store(), BenchConfig::default())
        .run()
        .await
        .unwrap();

    assert_eq!(run.dataset_size, 0);
    assert_eq!(run.terms.common, "login");
    assert_eq!(run.terms.rare, "error");
    assert_eq!(run.results.len(), 10);
    assert!(run.results.iter().all(|r| r.rows == 0));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_pages_partition_the_result(total in 0usize..400, limit in 1u32..120, seed in any::<u64>()) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let (expected, ids, ordered) = runtime.block_on(async {
            let engine = QueryEngine::new(seeded(total, seed).await);
            let first = engine.search(&SearchFilter::with_limit(limit)).await.unwrap();

            let mut records = first.records;
            for page in 2..=first.total_pages {
                let filter = SearchFilter::default().page(u32::try_from(page).unwrap(), limit);
                records.extend(engine.list(&filter).await.unwrap());
            }
            let ordered = records.windows(2).all(|w| w[0].created_at >= w[1].created_at);
            let ids: HashSet<_> = records.iter().map(|r| r.id).collect();
            (first.total, ids.len() as u64, ordered)
        });

        prop_assert_eq!(expected, total as u64);
        prop_assert_eq!(ids, expected);
        prop_assert!(ordered);
    }
}
