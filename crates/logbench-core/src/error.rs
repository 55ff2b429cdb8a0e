//! Error types for `logbench`.
//!
//! One error enum covers every core operation. Codes follow the pattern
//! `LOGB-XXX` so failures can be matched in logs without parsing messages.

use thiserror::Error;

/// Result type alias for `logbench` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in `logbench` operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed caller input, rejected before any storage access (LOGB-001).
    #[error("[LOGB-001] Invalid input: {0}")]
    InvalidInput(String),

    /// Storage unavailable or query execution failure (LOGB-002).
    #[error("[LOGB-002] Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bulk-load batch was rejected; earlier batches stay committed (LOGB-003).
    #[error("[LOGB-003] Batch {batch} failed: {source}")]
    BatchFailed {
        /// Zero-based index of the failing batch.
        batch: usize,
        /// Underlying storage error.
        #[source]
        source: Box<Error>,
    },

    /// Configuration error (LOGB-004).
    #[error("[LOGB-004] Configuration error: {0}")]
    Config(String),

    /// Serialization error (LOGB-005).
    #[error("[LOGB-005] Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (LOGB-006).
    #[error("[LOGB-006] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage returned something the engine cannot interpret (LOGB-007).
    #[error("[LOGB-007] Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Returns the error code (e.g., "LOGB-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "LOGB-001",
            Self::Database(_) => "LOGB-002",
            Self::BatchFailed { .. } => "LOGB-003",
            Self::Config(_) => "LOGB-004",
            Self::Serialization(_) => "LOGB-005",
            Self::Io(_) => "LOGB-006",
            Self::Storage(_) => "LOGB-007",
        }
    }

    /// Returns true if the caller is at fault (bad request rather than server failure).
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Wraps a storage error with the index of the batch that produced it.
    #[must_use]
    pub fn batch(batch: usize, source: Self) -> Self {
        Self::BatchFailed {
            batch,
            source: Box::new(source),
        }
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}
