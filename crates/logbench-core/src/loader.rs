//! Batched bulk loader.
//!
//! A load is a fold over a [`BatchPlan`]: each descriptor is expanded into
//! generated records, copied in one transfer, and the accepted row count is
//! accumulated. The first rejected batch aborts the load; earlier batches
//! stay committed.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::generator::{random_action, random_domain, random_uuid, ContentGenerator};
use crate::model::{Content, ContentSize, LogRecord};
use crate::store::LogStore;

/// Rows per batch when not configured.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// How far back `created_at` may be spread.
const BACKDATE_WINDOW_SECS: i64 = 30 * 24 * 60 * 60;

/// One batch of the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchDescriptor {
    /// Zero-based position in the plan.
    pub index: usize,
    /// Rows in this batch.
    pub size: usize,
}

/// Splits `total` rows into `ceil(total / batch_size)` batches.
///
/// Every batch is full except the last, which holds the remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    total: usize,
    batch_size: usize,
}

impl BatchPlan {
    /// Creates a plan.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `batch_size` is zero.
    pub fn new(total: usize, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::InvalidInput("batch_size must be >= 1".to_string()));
        }
        Ok(Self { total, batch_size })
    }

    /// Rows across all batches.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    /// Number of batches.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.total.div_ceil(self.batch_size)
    }

    /// True when `total` is zero.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Batch descriptors in submission order.
    pub fn iter(&self) -> impl Iterator<Item = BatchDescriptor> + '_ {
        (0..self.len()).map(move |index| {
            let start = index * self.batch_size;
            BatchDescriptor {
                index,
                size: self.batch_size.min(self.total - start),
            }
        })
    }
}

/// Outcome of a bulk load.
#[derive(Debug, Clone)]
pub struct LoadReport {
    /// Rows storage acknowledged.
    pub inserted: u64,
    /// Batches submitted.
    pub batches: usize,
    /// Size class generated.
    pub content_size: ContentSize,
    /// Wall time of the whole load.
    pub elapsed: Duration,
}

impl LoadReport {
    /// Rows per second; zero when nothing measurable elapsed.
    #[must_use]
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.inserted as f64 / secs
        } else {
            0.0
        }
    }
}

/// Generates synthetic records and writes them in batches.
pub struct BulkLoader {
    store: Arc<dyn LogStore>,
    batch_size: usize,
    show_progress: bool,
}

impl BulkLoader {
    /// Loader with the default batch size.
    #[must_use]
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self {
            store,
            batch_size: DEFAULT_BATCH_SIZE,
            show_progress: false,
        }
    }

    /// Overrides the batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Draws a terminal progress bar while loading.
    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Loads `total` records of `size` using an entropy-seeded source.
    ///
    /// # Errors
    ///
    /// Returns `BatchFailed` for the first batch storage rejects.
    pub async fn load(&self, total: usize, size: ContentSize) -> Result<LoadReport> {
        let mut rng = StdRng::from_entropy();
        self.load_with_rng(total, size, &mut rng).await
    }

    /// Loads `total` records of `size` drawing all randomness from `rng`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a zero batch size, or `BatchFailed` for the
    /// first batch storage rejects.
    pub async fn load_with_rng<R: Rng + Send + ?Sized>(
        &self,
        total: usize,
        size: ContentSize,
        rng: &mut R,
    ) -> Result<LoadReport> {
        let plan = BatchPlan::new(total, self.batch_size)?;
        let start = Instant::now();
        let now = Utc::now();
        let generator = ContentGenerator::at(now);
        let progress = self.progress_bar(total as u64);

        info!(total, batches = plan.len(), content_size = %size, "Starting bulk load");

        let mut inserted = 0u64;
        for batch in plan.iter() {
            let records = build_batch(rng, &generator, batch, size, now);
            let accepted = self
                .store
                .copy_batch(&records)
                .await
                .map_err(|e| Error::batch(batch.index, e))?;
            inserted += accepted;

            let percent = (batch.index + 1) as f64 / plan.len() as f64 * 100.0;
            info!(
                batch = batch.index + 1,
                of = plan.len(),
                rows = accepted,
                "Progress: {percent:.2}%"
            );
            progress.inc(accepted);
        }
        progress.finish_and_clear();

        let report = LoadReport {
            inserted,
            batches: plan.len(),
            content_size: size,
            elapsed: start.elapsed(),
        };
        info!(
            "Completed: inserted {} records in {:.2}s ({:.2} records/sec)",
            report.inserted,
            report.elapsed.as_secs_f64(),
            report.throughput()
        );
        Ok(report)
    }

    /// Inserts one record stamped with the current time.
    ///
    /// A missing `user_id` is replaced with a fresh one.
    ///
    /// # Errors
    ///
    /// Returns an error if storage rejects the insert.
    pub async fn record(
        &self,
        domain: impl Into<String>,
        action: impl Into<String>,
        user_id: Option<Uuid>,
        content: Content,
    ) -> Result<LogRecord> {
        let record = LogRecord::new(
            user_id.unwrap_or_else(Uuid::new_v4),
            domain,
            action,
            content,
            Utc::now(),
        );
        self.store.insert(&record).await?;
        Ok(record)
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }
}

/// Expands a descriptor into records: one user and one domain per batch,
/// action, content and backdated timestamp per row.
pub(crate) fn build_batch<R: Rng + ?Sized>(
    rng: &mut R,
    generator: &ContentGenerator,
    batch: BatchDescriptor,
    size: ContentSize,
    now: DateTime<Utc>,
) -> Vec<LogRecord> {
    let user_id = random_uuid(rng);
    let domain = random_domain(rng);

    (0..batch.size)
        .map(|_| {
            let action = random_action(rng);
            let content = generator.generate(rng, size);
            let backdate = ChronoDuration::seconds(rng.gen_range(0..BACKDATE_WINDOW_SECS));
            LogRecord {
                id: random_uuid(rng),
                user_id,
                domain: domain.to_string(),
                action: action.to_string(),
                content,
                created_at: now - backdate,
            }
        })
        .collect()
}
