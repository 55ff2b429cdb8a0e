//! Typed request/response boundary over the loader and query engine.
//!
//! Transport independent: the CLI drives it today, and any web front end
//! would map [`Error::is_client_error`] to a 4xx status. String query
//! parameters follow a lenient contract: empty values are treated as absent,
//! and an unparsable `user_id` or date is dropped (logged at `debug`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{LogbenchConfig, QueryConfig};
use crate::error::{Error, Result};
use crate::loader::BulkLoader;
use crate::model::{Content, ContentSize, LogRecord, SearchFilter};
use crate::query::{QueryEngine, QueryPage};
use crate::store::LogStore;

/// Dataset sizes `initialize` accepts.
pub const ALLOWED_RECORD_COUNTS: [usize; 5] = [1_000, 10_000, 100_000, 1_000_000, 10_000_000];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Request to generate and bulk-load a dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeRequest {
    /// One of [`ALLOWED_RECORD_COUNTS`].
    pub record_count: usize,
    /// `small`, `medium` or `large`.
    pub content_size: String,
}

impl InitializeRequest {
    /// Checks both fields and returns the parsed size class.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a count or size outside the allowed sets.
    pub fn validate(&self) -> Result<ContentSize> {
        if !ALLOWED_RECORD_COUNTS.contains(&self.record_count) {
            return Err(Error::InvalidInput(format!(
                "record_count must be one of {ALLOWED_RECORD_COUNTS:?} (got {})",
                self.record_count
            )));
        }
        self.content_size.parse()
    }
}

/// Result of a bulk load.
#[derive(Debug, Clone, Serialize)]
pub struct InitializeResponse {
    /// Human-readable status.
    pub message: String,
    /// Rows storage acknowledged.
    pub inserted_count: u64,
    /// Size class generated.
    pub content_size: ContentSize,
    /// Wall time, e.g. `1.52s`.
    pub duration: String,
    /// Throughput, two decimals.
    pub records_per_second: String,
}

/// Query-string contract of the list and search operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogQuery {
    /// Exact user match; ignored unless it parses as a UUID.
    pub user_id: Option<String>,
    /// Exact domain match.
    pub domain: Option<String>,
    /// `YYYY-MM-DD` inclusive lower bound.
    pub created_at: Option<String>,
    /// `YYYY-MM-DD` inclusive upper bound, widened to the end of the day.
    pub created_at_to: Option<String>,
    /// Full-text term.
    pub content_like: Option<String>,
    /// Partial (substring) term.
    pub search_term: Option<String>,
    /// 1-based page, default 1.
    pub page: Option<u32>,
    /// Page size, default from `query.default_limit`.
    pub limit: Option<u32>,
}

impl LogQuery {
    /// Lowers the query to a [`SearchFilter`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a zero page or limit, a limit above
    /// `max_limit`, or both `content_like` and `search_term`.
    pub fn to_filter(&self, config: &QueryConfig) -> Result<SearchFilter> {
        let page = self.page.unwrap_or(1);
        let limit = self.limit.unwrap_or(config.default_limit);
        if limit > config.max_limit {
            return Err(Error::InvalidInput(format!(
                "limit must be <= {} (got {limit})",
                config.max_limit
            )));
        }

        let mut filter = SearchFilter::default().page(page, limit);
        filter.validate()?;

        if let Some(raw) = non_empty(&self.user_id) {
            match Uuid::parse_str(raw) {
                Ok(user_id) => filter = filter.user(user_id),
                Err(e) => debug!(user_id = raw, error = %e, "Ignoring invalid user_id filter"),
            }
        }
        if let Some(domain) = non_empty(&self.domain) {
            filter = filter.domain(domain);
        }
        if let Some(date) = parse_date("created_at", &self.created_at) {
            filter = filter.created_on_or_after(date);
        }
        if let Some(date) = parse_date("created_at_to", &self.created_at_to) {
            filter = filter.created_on_or_before(date);
        }

        match (non_empty(&self.content_like), non_empty(&self.search_term)) {
            (Some(_), Some(_)) => {
                return Err(Error::InvalidInput(
                    "content_like and search_term are mutually exclusive".to_string(),
                ))
            }
            (Some(term), None) => filter = filter.full_text(term),
            (None, Some(term)) => filter = filter.partial(term),
            (None, None) => {}
        }
        Ok(filter)
    }
}

/// One page of records with pagination metadata.
#[derive(Debug, Clone, Serialize)]
pub struct LogListResponse {
    /// Records, newest first.
    pub data: Vec<LogRecord>,
    /// Matches across all pages.
    pub total: u64,
    /// 1-based page.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// `ceil(total / limit)`.
    pub total_pages: u64,
    /// Count plus fetch time, e.g. `3.2ms`.
    pub query_duration: String,
}

impl From<QueryPage> for LogListResponse {
    fn from(page: QueryPage) -> Self {
        Self {
            data: page.records,
            total: page.total,
            page: page.page,
            limit: page.limit,
            total_pages: page.total_pages,
            query_duration: format_duration(page.query_duration),
        }
    }
}

/// Single-record insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordRequest {
    /// Originating service.
    pub domain: String,
    /// Event type.
    pub action: String,
    /// Acting user; a fresh id is assigned when absent.
    #[serde(default)]
    pub user_id: Option<Uuid>,
    /// Payload; empty when absent.
    #[serde(default)]
    pub content: Content,
}

/// Plain confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Acknowledgement {
    /// Human-readable status.
    pub message: String,
}

/// Operations exposed to callers.
pub struct LogService {
    engine: QueryEngine,
    loader: BulkLoader,
    query: QueryConfig,
}

impl LogService {
    /// Service over `store` configured from `config`.
    #[must_use]
    pub fn new(store: Arc<dyn LogStore>, config: &LogbenchConfig) -> Self {
        Self {
            engine: QueryEngine::new(Arc::clone(&store)),
            loader: BulkLoader::new(store).with_batch_size(config.loader.batch_size),
            query: config.query.clone(),
        }
    }

    /// Replaces the loader, e.g. to enable a progress bar.
    #[must_use]
    pub fn with_loader(mut self, loader: BulkLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Generates and loads a dataset.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` before touching storage if the request is
    /// invalid, or `BatchFailed` for the first rejected batch.
    pub async fn initialize(&self, request: &InitializeRequest) -> Result<InitializeResponse> {
        let size = request.validate()?;
        info!(
            "Generating {} records with {} content size",
            request.record_count, size
        );

        let report = self.loader.load(request.record_count, size).await?;
        Ok(InitializeResponse {
            message: "Data initialized successfully".to_string(),
            inserted_count: report.inserted,
            content_size: size,
            duration: format_duration(report.elapsed),
            records_per_second: format!("{:.2}", report.throughput()),
        })
    }

    /// Filtered, paginated listing.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a malformed query, or a storage error.
    pub async fn list_logs(&self, query: &LogQuery) -> Result<LogListResponse> {
        let filter = query.to_filter(&self.query)?;
        Ok(self.engine.search(&filter).await?.into())
    }

    /// Partial-match search; `search_term` is required.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when `search_term` is missing or empty.
    pub async fn search_partial(&self, query: &LogQuery) -> Result<LogListResponse> {
        if non_empty(&query.search_term).is_none() {
            return Err(Error::InvalidInput("search_term is required".to_string()));
        }
        self.list_logs(query).await
    }

    /// Removes every record.
    ///
    /// # Errors
    ///
    /// Returns a storage error if truncation fails.
    pub async fn truncate(&self) -> Result<Acknowledgement> {
        self.engine.store().truncate().await?;
        Ok(Acknowledgement {
            message: "Database truncated successfully".to_string(),
        })
    }

    /// Inserts a single record stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty domain or action, or a storage error.
    pub async fn record(&self, request: RecordRequest) -> Result<LogRecord> {
        if request.domain.is_empty() || request.action.is_empty() {
            return Err(Error::InvalidInput("domain and action are required".to_string()));
        }
        self.loader
            .record(request.domain, request.action, request.user_id, request.content)
            .await
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn parse_date(field: &str, value: &Option<String>) -> Option<NaiveDate> {
    let raw = non_empty(value)?;
    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(e) => {
            debug!(field, value = raw, error = %e, "Ignoring invalid date filter");
            None
        }
    }
}

fn format_duration(duration: Duration) -> String {
    format!("{duration:.2?}")
}
