//! DDL for the log table and its supporting indexes.
//!
//! Each index backs one predicate mode of the query engine:
//!
//! | Index | Type | Predicate |
//! |-------|------|-----------|
//! | `idx_logs_user_id` | B-tree | `user_id = $n` |
//! | `idx_logs_domain` | B-tree | `domain = $n` |
//! | `idx_logs_content` | GIN `jsonb_path_ops` | `content @> $n` |
//! | `idx_logs_created_at` | BRIN | `created_at >= / <= $n` |
//! | `idx_logs_content_fts` | GIN tsvector | full-text |
//! | `idx_logs_content_trgm` | GIN `gin_trgm_ops` | `ILIKE '%term%'` |
//!
//! Statements are idempotent. Versioned migrations are not handled here.

/// Table every query targets.
pub const TABLE: &str = "logs";

/// Expression indexed for full-text search. Queries must use it verbatim.
pub const FTS_DOCUMENT: &str = "to_tsvector('english', content::text)";

/// Text search configuration for `plainto_tsquery`.
pub const FTS_CONFIG: &str = "english";

/// Bootstrap statements, in execution order.
pub const STATEMENTS: &[&str] = &[
    "CREATE EXTENSION IF NOT EXISTS pg_trgm",
    "CREATE TABLE IF NOT EXISTS logs (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL,
        domain TEXT NOT NULL,
        action TEXT NOT NULL,
        content JSONB NOT NULL DEFAULT '{}'::jsonb,
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_logs_user_id ON logs USING btree (user_id)",
    "CREATE INDEX IF NOT EXISTS idx_logs_domain ON logs USING btree (domain)",
    "CREATE INDEX IF NOT EXISTS idx_logs_content ON logs USING gin (content jsonb_path_ops)",
    "CREATE INDEX IF NOT EXISTS idx_logs_created_at ON logs USING brin (created_at)",
    "CREATE INDEX IF NOT EXISTS idx_logs_content_fts ON logs USING gin (to_tsvector('english', content::text))",
    "CREATE INDEX IF NOT EXISTS idx_logs_content_trgm ON logs USING gin ((content::text) gin_trgm_ops)",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_are_idempotent() {
        assert!(STATEMENTS.iter().all(|s| s.contains("IF NOT EXISTS")));
    }

    #[test]
    fn test_fts_index_matches_query_expression() {
        let fts_index = STATEMENTS
            .iter()
            .find(|s| s.contains("idx_logs_content_fts"))
            .expect("fts index");
        assert!(fts_index.contains(FTS_DOCUMENT));
    }

    #[test]
    fn test_all_index_families_present() {
        let ddl = STATEMENTS.join("\n");
        for family in ["btree (user_id)", "btree (domain)", "jsonb_path_ops", "brin", "gin_trgm_ops"] {
            assert!(ddl.contains(family), "missing {family}");
        }
    }
}
