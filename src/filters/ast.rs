use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Result cap when the caller does not give one
pub const DEFAULT_LIMIT: usize = 100;

/// History filter exactly as supplied by the caller, before validation.
///
/// Field semantics:
/// - `query`: case-insensitive substring over URL or title (excludes `pattern`)
/// - `pattern`: regex search over URL or title (excludes `query`)
/// - `after`: inclusive lower bound, `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`
/// - `before`: exclusive upper bound, same formats
/// - `days_back`: only visits from the last N days
/// - `limit`: maximum number of results (default 100)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryFilter {
    pub query: Option<String>,
    pub pattern: Option<String>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub days_back: Option<u32>,
    pub limit: Option<usize>,
}

/// The single active text predicate; `query` and `pattern` cannot both exist here.
#[derive(Debug, Clone)]
pub enum TextMatch {
    /// Lowercased needle for a case-insensitive substring test
    Substring(String),
    Pattern(Regex),
}

/// A validated history filter.
///
/// All time bounds are combined with AND. `since` is the bound derived from
/// `days_back` at validation time.
#[derive(Debug, Clone)]
pub struct FilterSpec {
    pub text: Option<TextMatch>,
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
    pub since: Option<DateTime<Utc>>,
    pub limit: usize,
}

impl FilterSpec {
    /// Effective inclusive lower bound: the later of `after` and `since`
    pub fn lower_bound(&self) -> Option<DateTime<Utc>> {
        match (self.after, self.since) {
            (Some(a), Some(s)) => Some(a.max(s)),
            (a, s) => a.or(s),
        }
    }

    pub fn upper_bound(&self) -> Option<DateTime<Utc>> {
        self.before
    }
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self { text: None, after: None, before: None, since: None, limit: DEFAULT_LIMIT }
    }
}
