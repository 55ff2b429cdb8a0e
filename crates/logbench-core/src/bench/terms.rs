//! Common/rare term discovery over sampled content.

use serde::Serialize;
use std::collections::HashMap;

use crate::model::LogRecord;

/// Used when the sample yields no tokens.
pub const FALLBACK_COMMON: &str = "login";
/// Used when the sample yields no tokens.
pub const FALLBACK_RARE: &str = "error";

/// Tokens of this many characters or fewer are ignored.
const MIN_TOKEN_CHARS: usize = 3;
/// A rare term occurs fewer than this many times in the sample.
const RARE_CEILING: usize = 5;

const TRIM_CHARS: &[char] = &['.', ',', '!', '?', '-', '(', ')', '[', ']', '{', '}', '"'];

/// Search terms picked from live data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Terms {
    /// Highest-frequency token.
    pub common: String,
    /// A low-frequency token.
    pub rare: String,
}

impl Default for Terms {
    fn default() -> Self {
        Self {
            common: FALLBACK_COMMON.to_string(),
            rare: FALLBACK_RARE.to_string(),
        }
    }
}

impl Terms {
    /// First one or two characters of the common term, or `"lo"`.
    #[must_use]
    pub fn short(&self) -> String {
        let short: String = self.common.chars().take(2).collect();
        if short.is_empty() {
            "lo".to_string()
        } else {
            short
        }
    }
}

/// Counts tokens in every string leaf and picks the common and rare terms.
///
/// Ties are broken lexicographically so the result does not depend on map
/// iteration order.
#[must_use]
pub fn discover_terms(sample: &[LogRecord]) -> Terms {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in sample {
        record.content.for_each_string(|text| {
            for word in text.split_whitespace() {
                let token = word.trim_matches(TRIM_CHARS).to_lowercase();
                if token.chars().count() > MIN_TOKEN_CHARS {
                    *counts.entry(token).or_default() += 1;
                }
            }
        });
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let Some((common, _)) = ranked.first() else {
        return Terms::default();
    };
    let rare = ranked
        .iter()
        .rev()
        .find(|(_, n)| (1..RARE_CEILING).contains(n))
        .or_else(|| ranked.last())
        .map_or_else(|| FALLBACK_RARE.to_string(), |(token, _)| token.clone());

    Terms {
        common: common.clone(),
        rare,
    }
}
