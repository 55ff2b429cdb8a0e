//! Log records, content documents and search filters.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Key under which an unparsable stored payload is surfaced.
pub const RAW_CONTENT_KEY: &str = "raw";

/// A persisted log entry. Never updated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Unique identifier, assigned at creation.
    pub id: Uuid,
    /// Acting principal. Not checked against any user table.
    pub user_id: Uuid,
    /// Originating service or site.
    pub domain: String,
    /// Event type label.
    pub action: String,
    /// Free-form structured document.
    pub content: Content,
    /// Event time (may be backdated), always UTC.
    pub created_at: DateTime<Utc>,
}

impl LogRecord {
    /// Builds a record with a fresh id.
    #[must_use]
    pub fn new(
        user_id: Uuid,
        domain: impl Into<String>,
        action: impl Into<String>,
        content: Content,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            domain: domain.into(),
            action: action.into(),
            content,
            created_at,
        }
    }
}

/// Schemaless content document: a mapping from string keys to JSON values.
///
/// Backed by `serde_json::Value`, so nested values are a tagged union of
/// string, number, bool, null, sequence and mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Content(Map<String, Value>);

impl Content {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Inserts a field, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Looks up a top-level field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Number of top-level fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the document has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Top-level field names.
    #[must_use]
    pub fn field_names(&self) -> BTreeSet<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    /// Borrows the underlying map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Decodes a stored payload.
    ///
    /// A payload that is not a JSON object degrades to `{"raw": <payload>}`
    /// instead of failing; `null` or empty input yields an empty document.
    #[must_use]
    pub fn from_stored(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Self::new();
        }
        match serde_json::from_str::<Map<String, Value>>(trimmed) {
            Ok(map) => Self(map),
            Err(_) => {
                let mut fallback = Self::new();
                fallback.insert(RAW_CONTENT_KEY, raw.to_string());
                fallback
            }
        }
    }

    /// Compact JSON encoding, as sent over COPY.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }

    /// Renders the document the way PostgreSQL prints `jsonb::text`.
    ///
    /// Keys are ordered by length then bytes, with `", "` and `": "`
    /// separators. Substring and token matching run against this text.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        write_jsonb_object(&self.0, &mut out);
        out
    }

    /// Visits every string leaf, recursing into mappings and sequences.
    pub fn for_each_string<'a>(&'a self, mut visit: impl FnMut(&'a str)) {
        fn walk<'a>(value: &'a Value, visit: &mut impl FnMut(&'a str)) {
            match value {
                Value::String(s) => visit(s),
                Value::Array(items) => items.iter().for_each(|v| walk(v, visit)),
                Value::Object(map) => map.values().for_each(|v| walk(v, visit)),
                _ => {}
            }
        }
        self.0.values().for_each(|v| walk(v, &mut visit));
    }
}

impl From<Map<String, Value>> for Content {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Content> for Value {
    fn from(content: Content) -> Self {
        Value::Object(content.0)
    }
}

fn write_jsonb_object(map: &Map<String, Value>, out: &mut String) {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.as_bytes().cmp(b.as_bytes())));

    out.push('{');
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push_str(": ");
        write_jsonb_value(&map[key], out);
    }
    out.push('}');
}

fn write_jsonb_value(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => write_jsonb_object(map, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_jsonb_value(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Record shape produced by the content generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentSize {
    /// Nine scalar fields.
    #[default]
    Small,
    /// Small plus network, billing, geo and session metadata.
    Medium,
    /// Medium plus hundreds of flat, nested and array fields.
    Large,
}

impl ContentSize {
    /// All size classes, smallest first.
    pub const ALL: [ContentSize; 3] = [Self::Small, Self::Medium, Self::Large];

    /// Wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl fmt::Display for ContentSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(Error::InvalidInput(format!(
                "content_size must be one of small, medium, large (got '{other}')"
            ))),
        }
    }
}

/// How a search term is matched against content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Language-aware token match over the tsvector index.
    FullText,
    /// Case-insensitive substring match over the trigram index.
    Partial,
}

impl SearchMode {
    /// Short label used in reports.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::FullText => "FTS",
            Self::Partial => "Partial",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A search term bound to its match mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMatch {
    /// Match strategy.
    pub mode: SearchMode,
    /// Search term, passed to storage as a bind parameter.
    pub term: String,
}

/// Ephemeral query descriptor. All present constraints are AND-combined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    /// Exact `user_id` match.
    pub user_id: Option<Uuid>,
    /// Exact `domain` match.
    pub domain: Option<String>,
    /// Inclusive lower bound on `created_at`.
    pub created_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub created_to: Option<DateTime<Utc>>,
    /// Full-text or partial term; the enum makes the two exclusive.
    pub text: Option<TextMatch>,
    /// 1-based page number.
    pub page: u32,
    /// Rows per page.
    pub limit: u32,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            user_id: None,
            domain: None,
            created_from: None,
            created_to: None,
            text: None,
            page: 1,
            limit: 50,
        }
    }
}

impl SearchFilter {
    /// Filter with no constraints returning `limit` rows of page 1.
    #[must_use]
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Sets the page and page size.
    #[must_use]
    pub fn page(mut self, page: u32, limit: u32) -> Self {
        self.page = page;
        self.limit = limit;
        self
    }

    /// Restricts to one domain.
    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Restricts to one user.
    #[must_use]
    pub fn user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Adds a full-text term, replacing any partial term.
    #[must_use]
    pub fn full_text(mut self, term: impl Into<String>) -> Self {
        self.text = Some(TextMatch {
            mode: SearchMode::FullText,
            term: term.into(),
        });
        self
    }

    /// Adds a partial (substring) term, replacing any full-text term.
    #[must_use]
    pub fn partial(mut self, term: impl Into<String>) -> Self {
        self.text = Some(TextMatch {
            mode: SearchMode::Partial,
            term: term.into(),
        });
        self
    }

    /// Adds a term in the given mode.
    #[must_use]
    pub fn matching(self, mode: SearchMode, term: impl Into<String>) -> Self {
        match mode {
            SearchMode::FullText => self.full_text(term),
            SearchMode::Partial => self.partial(term),
        }
    }

    /// Inclusive `created_at` lower bound at the start of `date` (UTC).
    #[must_use]
    pub fn created_on_or_after(mut self, date: NaiveDate) -> Self {
        self.created_from = Some(start_of_day(date));
        self
    }

    /// Inclusive `created_at` upper bound widened to 23:59:59 of `date` (UTC).
    #[must_use]
    pub fn created_on_or_before(mut self, date: NaiveDate) -> Self {
        self.created_to = Some(end_of_day(date));
        self
    }

    /// Rows skipped before the current page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// `ceil(total / limit)`; zero for an empty result.
    #[must_use]
    pub fn total_pages(&self, total: u64) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        total.div_ceil(u64::from(self.limit))
    }

    /// Checks the paging invariants (`page >= 1`, `limit >= 1`).
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when either is zero.
    pub fn validate(&self) -> Result<()> {
        if self.page == 0 {
            return Err(Error::InvalidInput("page must be >= 1".to_string()));
        }
        if self.limit == 0 {
            return Err(Error::InvalidInput("limit must be >= 1".to_string()));
        }
        Ok(())
    }

    /// Same predicates, first page, different size.
    #[must_use]
    pub fn first_page(&self, limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            ..self.clone()
        }
    }
}

/// Midnight UTC at the start of `date`.
#[must_use]
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// 23:59:59 UTC on `date`, so a single-day range covers the whole day.
#[must_use]
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&date.and_time(last_second))
}
