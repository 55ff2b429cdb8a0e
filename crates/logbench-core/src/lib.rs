//! # `logbench` Core
//!
//! Batched log ingestion and index-strategy benchmarks for PostgreSQL.
//!
//! A single append-only `logs` table is loaded with synthetic records and
//! queried through B-tree, GIN, BRIN and trigram indexes.
//!
//! ## Components
//!
//! - **Content generator** ([`generator`]): small, medium and large payloads
//!   with nested objects, arrays and multi-byte text
//! - **Bulk loader** ([`loader`]): fixed-size batches over `COPY FROM STDIN`
//! - **Query engine** ([`query`]): equality, date range, full-text and partial
//!   match, paired count and page
//! - **Benchmark harness** ([`bench`]): term discovery, warm-up and the
//!   ten-case full-text/partial matrix
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use logbench_core::{store, ContentSize, BulkLoader, LogbenchConfig, QueryEngine, SearchFilter};
//!
//! let config = LogbenchConfig::load()?;
//! let store = store::connect(&config.database).await?;
//!
//! BulkLoader::new(store.clone()).load(10_000, ContentSize::Medium).await?;
//!
//! let page = QueryEngine::new(store)
//!     .search(&SearchFilter::default().domain("app.io").partial("login"))
//!     .await?;
//! println!("{} matches in {:?}", page.total, page.query_duration);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)] // Acceptable for throughput and millisecond figures
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::wildcard_imports)]

pub mod api;
pub mod bench;
pub mod config;
pub mod error;
#[cfg(test)]
mod error_tests;
pub mod generator;
pub mod loader;
#[cfg(test)]
mod loader_tests;
pub mod model;
pub mod query;
pub mod store;

pub use api::{
    Acknowledgement, InitializeRequest, InitializeResponse, LogListResponse, LogQuery, LogService,
    RecordRequest,
};
pub use bench::{BenchmarkCase, BenchmarkRun, CaseResult, Harness, SeedPlan, Terms};
pub use config::LogbenchConfig;
pub use error::{Error, Result};
pub use generator::ContentGenerator;
pub use loader::{BatchPlan, BulkLoader, LoadReport};
pub use model::{Content, ContentSize, LogRecord, SearchFilter, SearchMode};
pub use query::{QueryEngine, QueryPage};
pub use store::{LogStore, MemoryLogStore, PgLogStore};
