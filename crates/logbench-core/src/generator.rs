//! Synthetic content generator.
//!
//! Produces log payloads in three size classes. Each class is a strict
//! superset of the previous one by field name (large ⊇ medium ⊇ small), so
//! queries written against small payloads stay valid on larger datasets.
//!
//! Randomness is always passed in; seed a `StdRng` for reproducible output.

use chrono::{DateTime, Duration, Months, SecondsFormat, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value;
use uuid::{Builder, Uuid};

use crate::model::{Content, ContentSize};

/// Flat `field_N` entries added by the large class.
pub const LARGE_FLAT_FIELDS: usize = 500;
/// Multi-byte `japanese_field_N` entries added by the large class.
pub const LARGE_TEXT_FIELDS: usize = 200;
/// `nested_obj_N` mappings added by the large class.
pub const LARGE_NESTED_OBJECTS: usize = 100;
/// Sub-fields per nested mapping.
pub const NESTED_OBJECT_FIELDS: usize = 10;
/// `array_field_N` sequences added by the large class.
pub const LARGE_ARRAY_FIELDS: usize = 50;

const DOMAINS: &[&str] = &[
    "example.com",
    "test.org",
    "demo.net",
    "app.io",
    "api.service.com",
    "web.portal.com",
    "mobile.app.net",
    "admin.system.org",
    "user.platform.io",
    "data.analytics.com",
    "payments.service.net",
    "content.media.org",
    "social.platform.io",
];

const RECORD_ACTIONS: &[&str] = &[
    "user_login",
    "user_logout",
    "page_view",
    "button_click",
    "form_submit",
    "file_upload",
    "file_download",
    "search_query",
    "filter_apply",
    "sort_change",
    "create_record",
    "update_record",
    "delete_record",
    "export_data",
    "import_data",
    "send_message",
    "receive_message",
    "share_content",
    "like_post",
    "comment_post",
    "subscribe",
    "unsubscribe",
    "follow_user",
    "unfollow_user",
    "report_issue",
    "request_feature",
    "update_settings",
    "change_password",
    "reset_password",
];

const CONTENT_ACTIONS: &[&str] = &[
    "login",
    "logout",
    "view",
    "click",
    "purchase",
    "search",
    "filter",
    "create",
    "update",
    "delete",
    "download",
    "upload",
    "share",
    "comment",
    "like",
    "dislike",
    "subscribe",
    "unsubscribe",
    "follow",
    "unfollow",
];

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 14_7_1 like Mac OS X)",
    "Mozilla/5.0 (Android 11; Mobile; rv:68.0) Gecko/68.0 Firefox/88.0",
];

const STATUSES: &[&str] = &["success", "failure", "pending", "timeout", "error", "warning", "info"];
const PROTOCOLS: &[&str] = &["HTTP", "HTTPS", "WebSocket", "gRPC", "TCP", "UDP"];
const ERROR_CODES: &[&str] = &["200", "201", "400", "401", "403", "404", "500", "502", "503", "504"];
const REGIONS: &[&str] = &["us-east-1", "us-west-2", "eu-west-1", "ap-southeast-1", "ap-northeast-1"];
const ENVIRONMENTS: &[&str] = &["production", "staging", "development", "testing"];
const FEATURE_FLAGS: &[&str] = &["new_ui", "beta_search", "advanced_analytics", "real_time_sync", "auto_backup"];
const SEGMENTS: &[&str] = &["premium", "basic", "trial", "enterprise", "free"];
const TIERS: &[&str] = &["bronze", "silver", "gold", "platinum", "diamond"];
const PLANS: &[&str] = &["starter", "professional", "business", "enterprise", "custom"];
const COUNTRIES: &[&str] = &["US", "UK", "CA", "AU", "DE", "FR", "JP", "SG", "IN", "BR"];
const CITIES: &[&str] = &[
    "New York", "London", "Toronto", "Sydney", "Berlin", "Paris", "Tokyo", "Singapore", "Mumbai", "São Paulo",
];
const TIMEZONES: &[&str] = &["UTC", "America/New_York", "Europe/London", "Asia/Tokyo", "Australia/Sydney"];
const LANGUAGES: &[&str] = &["en", "es", "fr", "de", "ja", "zh", "pt", "ru", "ar", "hi"];
const CURRENCIES: &[&str] = &["USD", "EUR", "GBP", "JPY", "CAD", "AUD", "CHF", "CNY", "INR", "BRL"];

/// Picks a random record-level domain label.
pub fn random_domain<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    pick(rng, DOMAINS)
}

/// Picks a random record-level action label.
pub fn random_action<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    pick(rng, RECORD_ACTIONS)
}

/// Draws a v4 UUID from `rng` (deterministic under a seeded source).
pub fn random_uuid<R: Rng + ?Sized>(rng: &mut R) -> Uuid {
    Builder::from_random_bytes(rng.gen()).into_uuid()
}

/// Generates a content document at the current time.
pub fn generate<R: Rng + ?Sized>(rng: &mut R, size: ContentSize) -> Content {
    ContentGenerator::new().generate(rng, size)
}

/// Content generator anchored to a reference clock.
///
/// Timestamp-valued fields are derived from `now`, so tests can pin both the
/// clock and the random source.
#[derive(Debug, Clone, Copy)]
pub struct ContentGenerator {
    now: DateTime<Utc>,
}

impl Default for ContentGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentGenerator {
    /// Generator using the wall clock at construction time.
    #[must_use]
    pub fn new() -> Self {
        Self { now: Utc::now() }
    }

    /// Generator with a fixed reference time.
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Generates one document of the requested size class.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R, size: ContentSize) -> Content {
        let mut content = Content::new();
        self.fill_small(rng, &mut content);
        if matches!(size, ContentSize::Medium | ContentSize::Large) {
            self.fill_medium(rng, &mut content);
        }
        if size == ContentSize::Large {
            fill_large(rng, &mut content);
        }
        content
    }

    fn fill_small<R: Rng + ?Sized>(&self, rng: &mut R, c: &mut Content) {
        c.insert("event_id", random_uuid(rng).to_string());
        c.insert("session_id", format!("sess_{}", rng.gen_range(0..100_000)));
        c.insert(
            "ip_address",
            format!("192.168.{}.{}", rng.gen_range(0..255), rng.gen_range(0..255)),
        );
        c.insert("user_agent", pick(rng, USER_AGENTS));
        c.insert("timestamp", self.now.timestamp());
        c.insert("action_type", pick(rng, CONTENT_ACTIONS));
        c.insert("status", pick(rng, STATUSES));
        c.insert("duration", rng.gen_range(100..5100));
        c.insert("device_id", format!("device_{}", rng.gen_range(0..10_000)));
    }

    fn fill_medium<R: Rng + ?Sized>(&self, rng: &mut R, c: &mut Content) {
        // network
        c.insert("request_id", random_uuid(rng).to_string());
        c.insert("correlation_id", format!("corr_{}", rng.gen_range(0..1_000_000)));
        c.insert(
            "source_ip",
            format!("10.0.{}.{}", rng.gen_range(0..255), rng.gen_range(0..255)),
        );
        c.insert(
            "destination_ip",
            format!("172.16.{}.{}", rng.gen_range(0..255), rng.gen_range(0..255)),
        );
        c.insert("protocol", pick(rng, PROTOCOLS));
        c.insert("port", rng.gen_range(0..65_535));
        c.insert("bytes_sent", rng.gen_range(0..1_000_000));
        c.insert("bytes_received", rng.gen_range(0..1_000_000));
        c.insert("latency", rng.gen_range(0..1000));
        c.insert("error_code", pick(rng, ERROR_CODES));
        c.insert("retry_count", rng.gen_range(0..5));
        c.insert("cache_hit", rng.gen_bool(0.5));
        c.insert("compression", rng.gen_bool(0.5));
        c.insert("encrypted", rng.gen_bool(0.5));

        // deployment
        c.insert("region", pick(rng, REGIONS));
        c.insert("datacenter", format!("dc-{}", rng.gen_range(1..=10)));
        c.insert(
            "service_version",
            format!(
                "v{}.{}.{}",
                rng.gen_range(1..=5),
                rng.gen_range(0..10),
                rng.gen_range(0..20)
            ),
        );
        c.insert("build_number", rng.gen_range(0..10_000));
        c.insert("environment", pick(rng, ENVIRONMENTS));

        // tenancy and billing
        c.insert("tenant_id", random_uuid(rng).to_string());
        c.insert("org_id", format!("org_{}", rng.gen_range(0..1000)));
        c.insert("team_id", format!("team_{}", rng.gen_range(0..100)));
        c.insert("project_id", format!("proj_{}", rng.gen_range(0..50)));
        c.insert("feature_flag", pick(rng, FEATURE_FLAGS));
        c.insert("ab_test", format!("test_{}", rng.gen_range(0..100)));
        c.insert("experiment_id", random_uuid(rng).to_string());
        c.insert("segment", pick(rng, SEGMENTS));
        c.insert("cohort", format!("cohort_{}", rng.gen_range(1..=10)));
        c.insert("tier", pick(rng, TIERS));
        c.insert("plan", pick(rng, PLANS));
        c.insert("quota", rng.gen_range(0..10_000));
        c.insert("usage", rng.gen_range(0..1000));
        c.insert("limit", rng.gen_range(0..5000));
        c.insert("remaining", rng.gen_range(0..1000));
        let renewal = self
            .now
            .checked_add_months(Months::new(rng.gen_range(0..12)))
            .unwrap_or(self.now);
        c.insert("renewal_date", renewal.format("%Y-%m-%d").to_string());

        // session
        c.insert("last_login", self.seconds_ago(rng.gen_range(0..86_400)));
        c.insert("first_login", self.seconds_ago(rng.gen_range(0..86_400 * 30)));
        c.insert("session_count", rng.gen_range(0..100));
        c.insert("total_sessions", rng.gen_range(0..1000));

        // geo and locale
        c.insert("country", pick(rng, COUNTRIES));
        c.insert("city", pick(rng, CITIES));
        c.insert("timezone", pick(rng, TIMEZONES));
        c.insert("language", pick(rng, LANGUAGES));
        c.insert("currency", pick(rng, CURRENCIES));

        let description_len = rng.gen_range(20..120);
        c.insert("description", japanese_text(rng, description_len));
        let notes_len = rng.gen_range(10..60);
        c.insert("notes", japanese_text(rng, notes_len));
    }

    fn seconds_ago(&self, secs: i64) -> String {
        (self.now - Duration::seconds(secs)).to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

fn fill_large<R: Rng + ?Sized>(rng: &mut R, c: &mut Content) {
    for i in 0..LARGE_FLAT_FIELDS {
        let value = format!("value_{}_{}", rng.gen_range(0..100_000), japanese_text(rng, 5));
        c.insert(format!("field_{i}"), value);
    }

    for i in 0..LARGE_TEXT_FIELDS {
        let len = rng.gen_range(20..120);
        c.insert(format!("japanese_field_{i}"), japanese_text(rng, len));
    }

    for i in 0..LARGE_NESTED_OBJECTS {
        let mut nested = serde_json::Map::with_capacity(NESTED_OBJECT_FIELDS);
        for j in 0..NESTED_OBJECT_FIELDS {
            let value = format!("nested_value_{}_{}", rng.gen_range(0..1000), japanese_text(rng, 5));
            nested.insert(format!("nested_field_{j}"), Value::String(value));
        }
        c.insert(format!("nested_obj_{i}"), Value::Object(nested));
    }

    for i in 0..LARGE_ARRAY_FIELDS {
        let len = rng.gen_range(1..=20);
        let items: Vec<Value> = (0..len)
            .map(|j| Value::String(format!("array_item_{i}_{j}_{}", japanese_text(rng, 5))))
            .collect();
        c.insert(format!("array_field_{i}"), Value::Array(items));
    }
}

/// Random Japanese-script text of `len` characters.
///
/// Each character is Hiragana, Katakana or one of the first 4096 CJK
/// ideographs with equal probability.
pub fn japanese_text<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| {
            let code = match rng.gen_range(0..3) {
                0 => rng.gen_range(0x3040..=0x309F),
                1 => rng.gen_range(0x30A0..=0x30FF),
                _ => rng.gen_range(0x4E00..0x5E00),
            };
            char::from_u32(code).unwrap_or('\u{3042}')
        })
        .collect()
}

fn pick<R: Rng + ?Sized>(rng: &mut R, items: &'static [&'static str]) -> &'static str {
    items.choose(rng).copied().unwrap_or_default()
}
