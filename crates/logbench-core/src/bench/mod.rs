//! Benchmark harness.
//!
//! A run walks the phases in [`Phase`] order: connect, count the dataset,
//! discover search terms, optionally seed, warm up, then time each case of
//! the full-text/partial matrix. Connection and count failures end the run;
//! a failing case is logged and skipped.

mod terms;

pub use terms::{discover_terms, Terms, FALLBACK_COMMON, FALLBACK_RARE};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::BenchConfig;
use crate::error::Result;
use crate::generator::random_uuid;
use crate::loader::{BulkLoader, LoadReport};
use crate::model::{ContentSize, SearchFilter, SearchMode};
use crate::query::QueryEngine;
use crate::store::LogStore;

/// Harness phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Prove the store is reachable.
    Connect,
    /// Count existing records.
    CountExisting,
    /// Sample records and pick terms.
    DiscoverTerms,
    /// Optional truncate and load.
    Seed,
    /// One untimed query.
    WarmUp,
    /// Timed cases.
    ExecuteCaseMatrix,
    /// Results handed back.
    Report,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::CountExisting => "count",
            Self::DiscoverTerms => "discover-terms",
            Self::Seed => "seed",
            Self::WarmUp => "warm-up",
            Self::ExecuteCaseMatrix => "execute",
            Self::Report => "report",
        };
        f.write_str(name)
    }
}

/// Data to load before measuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedPlan {
    /// Records to generate.
    pub count: usize,
    /// Size class to generate.
    pub content_size: ContentSize,
    /// Empty the table first.
    pub truncate: bool,
}

/// One timed query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenchmarkCase {
    /// Row label, e.g. "FTS Rare (Few)".
    pub name: String,
    /// Match strategy.
    pub mode: SearchMode,
    /// Search term.
    pub term: String,
    /// Row cap passed as the page size.
    pub limit: u32,
    /// The cap equals the dataset size.
    pub uncapped: bool,
    /// Free-text explanation.
    pub description: String,
}

impl BenchmarkCase {
    /// Cap as shown in reports: the number, or `ALL` when uncapped.
    #[must_use]
    pub fn limit_label(&self) -> String {
        if self.uncapped {
            "ALL".to_string()
        } else {
            self.limit.to_string()
        }
    }
}

/// A case with its measurement.
#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    /// The case that ran.
    #[serde(flatten)]
    pub case: BenchmarkCase,
    /// Wall time of the query.
    #[serde(rename = "duration_ms", serialize_with = "millis")]
    pub duration: Duration,
    /// Rows returned.
    pub rows: usize,
}

/// A case that failed and was left out of the results.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedCase {
    /// Case label.
    pub name: String,
    /// Error message.
    pub error: String,
}

/// Outcome of one harness run.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkRun {
    /// Records present when the cases ran.
    pub dataset_size: u64,
    /// Size class loaded by the seed step, if any.
    pub content_size: Option<ContentSize>,
    /// Terms the cases searched for.
    pub terms: Terms,
    /// Completed cases, in matrix order.
    pub results: Vec<CaseResult>,
    /// Cases that failed.
    pub skipped: Vec<SkippedCase>,
    /// Seed throughput, when a seed step ran.
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "seed_summary")]
    pub seed: Option<LoadReport>,
}

fn millis<S: Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}

fn seed_summary<S: Serializer>(
    report: &Option<LoadReport>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct Summary {
        inserted: u64,
        batches: usize,
        elapsed_ms: f64,
        records_per_second: f64,
    }
    report
        .as_ref()
        .map(|r| Summary {
            inserted: r.inserted,
            batches: r.batches,
            elapsed_ms: r.elapsed.as_secs_f64() * 1000.0,
            records_per_second: r.throughput(),
        })
        .serialize(serializer)
}

/// Builds the ten-case matrix for a dataset of `dataset_size` records.
#[must_use]
pub fn case_matrix(terms: &Terms, not_found: &str, dataset_size: u64, capped_limit: u32) -> Vec<BenchmarkCase> {
    // a zero page size is rejected, so an empty dataset still asks for one row
    let all = u32::try_from(dataset_size).unwrap_or(u32::MAX).max(1);
    let short = terms.short();

    [SearchMode::FullText, SearchMode::Partial]
        .into_iter()
        .flat_map(|mode| {
            let label = mode.label();
            let case = |name: &str, term: &str, limit: u32, uncapped: bool, description: &str| BenchmarkCase {
                name: format!("{label} {name}"),
                mode,
                term: term.to_string(),
                limit,
                uncapped,
                description: description.to_string(),
            };
            [
                case("Not Found", not_found, capped_limit, false, "Random UUID"),
                case("Rare (Few)", &terms.rare, capped_limit, false, "Rare term"),
                case(
                    "Common (Many) Limit",
                    &terms.common,
                    capped_limit,
                    false,
                    &format!("Common term, Limit {capped_limit}"),
                ),
                case("Common (Many) NoLimit", &terms.common, all, true, "Common term, Full Scan"),
                case("Short Input", &short, capped_limit, false, "1-2 chars"),
            ]
        })
        .collect()
}

/// Drives a benchmark run against one store.
pub struct Harness {
    engine: QueryEngine,
    loader: BulkLoader,
    config: BenchConfig,
    seed: Option<SeedPlan>,
}

impl Harness {
    /// Harness over `store` with default loader settings.
    #[must_use]
    pub fn new(store: Arc<dyn LogStore>, config: BenchConfig) -> Self {
        Self {
            engine: QueryEngine::new(Arc::clone(&store)),
            loader: BulkLoader::new(store),
            config,
            seed: None,
        }
    }

    /// Replaces the loader used by the seed step.
    #[must_use]
    pub fn with_loader(mut self, loader: BulkLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Loads data before measuring.
    #[must_use]
    pub fn with_seed(mut self, seed: SeedPlan) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Runs every phase with an entropy-seeded random source.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable, the count fails, or the
    /// seed step fails.
    pub async fn run(&self) -> Result<BenchmarkRun> {
        let mut rng = StdRng::from_entropy();
        self.run_with_rng(&mut rng).await
    }

    /// Runs every phase drawing randomness from `rng`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable, the count fails, or the
    /// seed step fails.
    pub async fn run_with_rng<R: Rng + Send + ?Sized>(&self, rng: &mut R) -> Result<BenchmarkRun> {
        let store = self.engine.store();

        info!(phase = %Phase::Connect, backend = store.backend(), "Connecting");
        store.ping().await?;

        let mut dataset_size = self.engine.count(&SearchFilter::default()).await?;
        info!(phase = %Phase::CountExisting, dataset_size, "Dataset size: {dataset_size}");

        let mut terms = self.discover().await;
        info!(
            phase = %Phase::DiscoverTerms,
            common = %terms.common,
            rare = %terms.rare,
            "Terms discovered"
        );

        let mut seed_report = None;
        if let Some(seed) = self.seed {
            if seed.truncate {
                store.truncate().await?;
            }
            let report = self.loader.load_with_rng(seed.count, seed.content_size, rng).await?;
            dataset_size = self.engine.count(&SearchFilter::default()).await?;
            info!(
                phase = %Phase::Seed,
                inserted = report.inserted,
                dataset_size,
                "Seeded {} {} records",
                report.inserted,
                seed.content_size
            );
            seed_report = Some(report);
            terms = self.discover().await;
        }

        info!(phase = %Phase::WarmUp, "Warming up");
        let warmup = SearchFilter::with_limit(self.config.warmup_limit.max(1)).full_text(terms.common.clone());
        if let Err(e) = self.engine.list(&warmup).await {
            warn!(error = %e, "Warm-up query failed");
        }

        let not_found = random_uuid(rng).to_string();
        let cases = case_matrix(&terms, &not_found, dataset_size, self.config.capped_limit);
        info!(phase = %Phase::ExecuteCaseMatrix, cases = cases.len(), "Running benchmark");

        let mut results = Vec::with_capacity(cases.len());
        let mut skipped = Vec::new();
        for case in cases {
            match self.run_case(&case).await {
                Ok((duration, rows)) => results.push(CaseResult { case, duration, rows }),
                Err(e) => {
                    warn!(case = %case.name, error = %e, "Case failed, skipping");
                    skipped.push(SkippedCase {
                        name: case.name,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(phase = %Phase::Report, completed = results.len(), skipped = skipped.len(), "Benchmark complete");
        Ok(BenchmarkRun {
            dataset_size,
            content_size: self.seed.map(|s| s.content_size),
            terms,
            results,
            skipped,
            seed: seed_report,
        })
    }

    async fn discover(&self) -> Terms {
        let sample = SearchFilter::with_limit(self.config.sample_size.max(1));
        match self.engine.list(&sample).await {
            Ok(records) => discover_terms(&records),
            Err(e) => {
                warn!(error = %e, "Term discovery failed, using defaults");
                Terms::default()
            }
        }
    }

    async fn run_case(&self, case: &BenchmarkCase) -> Result<(Duration, usize)> {
        let filter = SearchFilter::with_limit(case.limit).matching(case.mode, case.term.clone());
        let start = Instant::now();
        let rows = self.engine.list(&filter).await?.len();
        Ok((start.elapsed(), rows))
    }
}
