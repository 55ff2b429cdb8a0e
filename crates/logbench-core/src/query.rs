//! Filtered query engine.
//!
//! A [`SearchFilter`] is lowered into an ordered list of [`Predicate`]s that
//! every backend evaluates the same way. `count` and `list` are always
//! computed from the same predicate list, so the reported total matches the
//! page (best effort: the two statements do not share a snapshot).

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::model::{LogRecord, SearchFilter, SearchMode};
use crate::store::LogStore;

/// One AND-ed constraint over the log table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `user_id = $n`
    UserId(Uuid),
    /// `domain = $n`
    Domain(String),
    /// `created_at >= $n`
    CreatedFrom(DateTime<Utc>),
    /// `created_at <= $n`
    CreatedTo(DateTime<Utc>),
    /// Token match over the english tsvector of the content text.
    FullText(String),
    /// Case-insensitive literal substring of the content text.
    Partial(String),
}

/// Lowers a filter to predicates. Absent fields impose no constraint.
#[must_use]
pub fn predicates(filter: &SearchFilter) -> Vec<Predicate> {
    let mut out = Vec::with_capacity(5);
    if let Some(user_id) = filter.user_id {
        out.push(Predicate::UserId(user_id));
    }
    if let Some(domain) = &filter.domain {
        out.push(Predicate::Domain(domain.clone()));
    }
    if let Some(from) = filter.created_from {
        out.push(Predicate::CreatedFrom(from));
    }
    if let Some(to) = filter.created_to {
        out.push(Predicate::CreatedTo(to));
    }
    if let Some(text) = &filter.text {
        out.push(match text.mode {
            SearchMode::FullText => Predicate::FullText(text.term.clone()),
            SearchMode::Partial => Predicate::Partial(text.term.clone()),
        });
    }
    out
}

/// Escapes `%`, `_` and `\` so a term matches literally inside `ILIKE`.
#[must_use]
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// A page of results with pagination metadata.
#[derive(Debug, Clone, Serialize)]
pub struct QueryPage {
    /// Records on this page, newest first.
    pub records: Vec<LogRecord>,
    /// Matching records across all pages.
    pub total: u64,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// `ceil(total / limit)`.
    pub total_pages: u64,
    /// Wall time of count plus list.
    #[serde(skip)]
    pub query_duration: Duration,
}

/// Read side of the log table.
///
/// Holds no mutable state; clones share the same store handle.
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn LogStore>,
}

impl QueryEngine {
    /// Creates an engine over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }

    /// Number of records matching the filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter is invalid or storage fails.
    pub async fn count(&self, filter: &SearchFilter) -> Result<u64> {
        filter.validate()?;
        self.store.count(filter).await
    }

    /// The filter's page, in reverse creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter is invalid or storage fails.
    pub async fn list(&self, filter: &SearchFilter) -> Result<Vec<LogRecord>> {
        filter.validate()?;
        self.store.list(filter).await
    }

    /// Counts, then fetches the page, and times both.
    ///
    /// # Errors
    ///
    /// Returns an error if either query fails; no partial page is returned.
    pub async fn search(&self, filter: &SearchFilter) -> Result<QueryPage> {
        filter.validate()?;
        let start = Instant::now();

        let total = self.store.count(filter).await?;
        let records = self.store.list(filter).await?;

        let query_duration = start.elapsed();
        debug!(
            backend = self.store.backend(),
            total,
            returned = records.len(),
            elapsed_ms = query_duration.as_secs_f64() * 1000.0,
            "search complete"
        );

        Ok(QueryPage {
            records,
            total,
            page: filter.page,
            limit: filter.limit,
            total_pages: filter.total_pages(total),
            query_duration,
        })
    }

    /// Underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn LogStore> {
        &self.store
    }
}
