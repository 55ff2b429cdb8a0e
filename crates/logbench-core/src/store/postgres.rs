//! PostgreSQL backend.
//!
//! Batches go through `COPY ... FROM STDIN` in text format. Reads are built
//! with [`QueryBuilder`] so every search value travels as a bind parameter.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use super::schema::{FTS_CONFIG, FTS_DOCUMENT, STATEMENTS, TABLE};
use super::LogStore;
use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::model::{Content, LogRecord, SearchFilter};
use crate::query::{like_pattern, predicates, Predicate};

const COLUMNS: &str = "id, user_id, domain, action, content, created_at";

/// Log store backed by a `PgPool`.
#[derive(Clone)]
pub struct PgLogStore {
    pool: PgPool,
}

impl PgLogStore {
    /// Opens a connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if no connection can be established.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect(&config.url)
            .await?;

        info!(max_connections = config.max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the table, extension and indexes if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if any DDL statement fails.
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!(table = TABLE, "Schema ready");
        Ok(())
    }
}

#[async_trait]
impl LogStore for PgLogStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn copy_batch(&self, records: &[LogRecord]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let build_start = Instant::now();
        let payload = encode_copy_rows(records)?;
        let build_time = build_start.elapsed();

        let copy_start = Instant::now();
        let mut conn = self.pool.acquire().await?;
        let mut copy = conn
            .copy_in_raw(&format!("COPY {TABLE} ({COLUMNS}) FROM STDIN"))
            .await?;
        copy.send(payload.as_bytes()).await?;
        let accepted = copy.finish().await?;

        debug!(
            rows = records.len(),
            accepted,
            payload_mb = payload.len() as f64 / 1_048_576.0,
            build_ms = build_time.as_secs_f64() * 1000.0,
            copy_ms = copy_start.elapsed().as_secs_f64() * 1000.0,
            "COPY batch"
        );
        Ok(accepted)
    }

    async fn insert(&self, record: &LogRecord) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO {TABLE} ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
        ))
        .bind(record.id)
        .bind(record.user_id)
        .bind(&record.domain)
        .bind(&record.action)
        .bind(Json(&record.content))
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn count(&self, filter: &SearchFilter) -> Result<u64> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {TABLE}"));
        push_predicates(&mut builder, filter);

        let total: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        u64::try_from(total).map_err(|_| Error::Storage(format!("negative count {total}")))
    }

    async fn list(&self, filter: &SearchFilter) -> Result<Vec<LogRecord>> {
        let offset = i64::try_from(filter.offset())
            .map_err(|_| Error::InvalidInput("page is too large".to_string()))?;

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT id, user_id, domain, action, content::text AS content, created_at FROM {TABLE}"
        ));
        push_predicates(&mut builder, filter);
        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(i64::from(filter.limit))
            .push(" OFFSET ")
            .push_bind(offset);

        let rows: Vec<LogRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(LogRecord::from).collect())
    }

    async fn truncate(&self) -> Result<()> {
        sqlx::query(&format!("TRUNCATE TABLE {TABLE}"))
            .execute(&self.pool)
            .await?;
        info!(table = TABLE, "Truncated");
        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct LogRow {
    id: Uuid,
    user_id: Uuid,
    domain: String,
    action: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<LogRow> for LogRecord {
    fn from(row: LogRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            domain: row.domain,
            action: row.action,
            content: Content::from_stored(&row.content),
            created_at: row.created_at,
        }
    }
}

/// Appends `WHERE a AND b ...` for the filter, binding every value.
fn push_predicates(builder: &mut QueryBuilder<'_, Postgres>, filter: &SearchFilter) {
    for (i, predicate) in predicates(filter).into_iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        match predicate {
            Predicate::UserId(user_id) => {
                builder.push("user_id = ").push_bind(user_id);
            }
            Predicate::Domain(domain) => {
                builder.push("domain = ").push_bind(domain);
            }
            Predicate::CreatedFrom(from) => {
                builder.push("created_at >= ").push_bind(from);
            }
            Predicate::CreatedTo(to) => {
                builder.push("created_at <= ").push_bind(to);
            }
            Predicate::FullText(term) => {
                builder
                    .push(format!("{FTS_DOCUMENT} @@ plainto_tsquery('{FTS_CONFIG}', "))
                    .push_bind(term)
                    .push(")");
            }
            Predicate::Partial(term) => {
                builder
                    .push("content::text ILIKE ")
                    .push_bind(like_pattern(&term))
                    .push(" ESCAPE '\\'");
            }
        }
    }
}

/// Renders rows in COPY text format: tab-separated, newline-terminated.
fn encode_copy_rows(records: &[LogRecord]) -> Result<String> {
    let mut out = String::with_capacity(records.len() * 256);
    for record in records {
        let content = record.content.to_json()?;
        out.push_str(&record.id.to_string());
        out.push('\t');
        out.push_str(&record.user_id.to_string());
        out.push('\t');
        out.push_str(&escape_copy(&record.domain));
        out.push('\t');
        out.push_str(&escape_copy(&record.action));
        out.push('\t');
        out.push_str(&escape_copy(&content));
        out.push('\t');
        out.push_str(&record.created_at.to_rfc3339_opts(SecondsFormat::Micros, true));
        out.push('\n');
    }
    Ok(out)
}

fn escape_copy(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sql_for(filter: &SearchFilter) -> String {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM logs");
        push_predicates(&mut builder, filter);
        builder.sql().to_string()
    }

    #[test]
    fn test_no_predicates_no_where() {
        assert_eq!(sql_for(&SearchFilter::default()), "SELECT COUNT(*) FROM logs");
    }

    #[test]
    fn test_predicates_are_bound_and_anded() {
        let filter = SearchFilter::default()
            .domain("app.io")
            .user(Uuid::new_v4())
            .full_text("login");

        assert_eq!(
            sql_for(&filter),
            "SELECT COUNT(*) FROM logs WHERE user_id = $1 AND domain = $2 \
             AND to_tsvector('english', content::text) @@ plainto_tsquery('english', $3)"
        );
    }

    #[test]
    fn test_partial_uses_escaped_ilike() {
        let sql = sql_for(&SearchFilter::default().partial("50%"));
        assert!(sql.ends_with("content::text ILIKE $1 ESCAPE '\\'"));
        assert!(!sql.contains("50%"));
    }

    #[test]
    fn test_copy_rows_escape_control_characters() {
        let mut content = Content::new();
        content.insert("message", "line one\nline\ttwo \\ end");
        let created_at = Utc.with_ymd_and_hms(2024, 6, 15, 8, 30, 0).unwrap();
        let record = LogRecord::new(Uuid::nil(), "app.io", "login", content, created_at);

        let encoded = encode_copy_rows(std::slice::from_ref(&record)).expect("encode");

        assert!(encoded.ends_with("\t2024-06-15T08:30:00.000000Z\n"));
        assert_eq!(encoded.matches('\n').count(), 1);
        assert_eq!(encoded.matches('\t').count(), 5);
        assert!(encoded.contains(r"line one\\nline\\ttwo \\\\ end"));
    }
}
