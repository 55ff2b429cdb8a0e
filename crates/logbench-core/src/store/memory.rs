//! In-process backend for tests and `--dry-run`.
//!
//! Evaluates the same [`Predicate`] list as the SQL backend. Full-text match
//! is an approximation: lowercase alphanumeric tokens, no stemming and no
//! stop words.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::LogStore;
use crate::error::{Error, Result};
use crate::model::{LogRecord, SearchFilter};
use crate::query::{predicates, Predicate};

/// Log store held in a `Vec` behind an async lock.
#[derive(Default)]
pub struct MemoryLogStore {
    records: RwLock<Vec<LogRecord>>,
    batches_until_failure: Option<AtomicUsize>,
}

impl MemoryLogStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that accepts `batches` COPY batches, then rejects every later one.
    #[must_use]
    pub fn failing_after(batches: usize) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            batches_until_failure: Some(AtomicUsize::new(batches)),
        }
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// True when nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn take_batch_permit(&self) -> Result<()> {
        let Some(remaining) = &self.batches_until_failure else {
            return Ok(());
        };
        remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .map(|_| ())
            .map_err(|_| Error::Storage("connection reset during COPY".to_string()))
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn copy_batch(&self, records: &[LogRecord]) -> Result<u64> {
        self.take_batch_permit()?;
        self.records.write().await.extend_from_slice(records);
        Ok(records.len() as u64)
    }

    async fn insert(&self, record: &LogRecord) -> Result<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn count(&self, filter: &SearchFilter) -> Result<u64> {
        let preds = predicates(filter);
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| matches_all(r, &preds)).count() as u64)
    }

    async fn list(&self, filter: &SearchFilter) -> Result<Vec<LogRecord>> {
        let preds = predicates(filter);
        let records = self.records.read().await;

        let mut hits: Vec<&LogRecord> = records.iter().filter(|r| matches_all(r, &preds)).collect();
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        let offset = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        Ok(hits
            .into_iter()
            .skip(offset)
            .take(filter.limit as usize)
            .cloned()
            .collect())
    }

    async fn truncate(&self) -> Result<()> {
        self.records.write().await.clear();
        Ok(())
    }
}

fn matches_all(record: &LogRecord, preds: &[Predicate]) -> bool {
    preds.iter().all(|p| matches(record, p))
}

fn matches(record: &LogRecord, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::UserId(user_id) => record.user_id == *user_id,
        Predicate::Domain(domain) => record.domain == *domain,
        Predicate::CreatedFrom(from) => record.created_at >= *from,
        Predicate::CreatedTo(to) => record.created_at <= *to,
        Predicate::FullText(term) => {
            let wanted = tokens(term);
            if wanted.is_empty() {
                return false;
            }
            let present = tokens(&record.content.to_text());
            wanted.is_subset(&present)
        }
        Predicate::Partial(term) => record
            .content
            .to_text()
            .to_lowercase()
            .contains(&term.to_lowercase()),
    }
}

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}
