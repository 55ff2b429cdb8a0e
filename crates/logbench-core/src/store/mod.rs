//! Storage backends for the log table.
//!
//! The engine talks to storage only through [`LogStore`]. The PostgreSQL
//! backend is the one being benchmarked; the in-memory backend evaluates the
//! same predicates in process and backs tests and dry runs.

pub mod memory;
pub mod postgres;
pub mod schema;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::model::{LogRecord, SearchFilter};

pub use memory::MemoryLogStore;
pub use postgres::PgLogStore;

/// Operations the engine needs from storage.
///
/// Implementations must be safe to share between concurrent readers; the
/// engine adds no locking of its own.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Backend name, for logs and reports.
    fn backend(&self) -> &'static str;

    /// Round-trips to storage to prove the connection works.
    async fn ping(&self) -> Result<()>;

    /// Bulk-copies a batch in one transfer.
    ///
    /// Returns the number of rows storage accepted.
    async fn copy_batch(&self, records: &[LogRecord]) -> Result<u64>;

    /// Inserts a single record.
    async fn insert(&self, record: &LogRecord) -> Result<()>;

    /// Counts records matching the filter's predicates (paging ignored).
    async fn count(&self, filter: &SearchFilter) -> Result<u64>;

    /// Returns the filter's page, newest `created_at` first.
    async fn list(&self, filter: &SearchFilter) -> Result<Vec<LogRecord>>;

    /// Removes every record.
    async fn truncate(&self) -> Result<()>;
}

/// Opens the PostgreSQL store described by `config`, creating the schema
/// first when `bootstrap_schema` is set.
///
/// # Errors
///
/// Returns an error if the pool cannot connect or the schema cannot be created.
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn LogStore>> {
    let store = PgLogStore::connect(config).await?;
    if config.bootstrap_schema {
        store.ensure_schema().await?;
    }
    Ok(Arc::new(store))
}
