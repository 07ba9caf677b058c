//! Validation of raw history filters.
//!
//! Turns a caller-supplied [`HistoryFilter`] into a [`FilterSpec`] or a
//! [`Error::Validation`] that names the offending field. Nothing here touches the
//! history store, so a bad filter fails before a single row is read.
//!
//! # Rules
//!
//! - `query` and `pattern` are mutually exclusive
//! - `pattern` must compile; the regex compiler's diagnostic is passed through verbatim
//! - `after` / `before` accept `YYYY-MM-DD` (midnight) or `YYYY-MM-DDTHH:MM:SS`, in UTC
//! - `limit` must be at least 1
//!
//! # Examples
//!
//! ```rust
//! # use chromium_sync::filters::{HistoryFilter, parse_filter};
//! let filter = HistoryFilter { query: Some("docs.rs".into()), after: Some("2026-01-01".into()), ..Default::default() };
//! let spec = parse_filter(&filter, chrono::Utc::now()).unwrap();
//! assert_eq!(spec.limit, 100);
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

use super::ast::{DEFAULT_LIMIT, FilterSpec, HistoryFilter, TextMatch};
use crate::error::{Error, Result};
use crate::utils::epoch::days_back_bound;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Validate a filter, resolving `days_back` against `now`
pub fn parse_filter(filter: &HistoryFilter, now: DateTime<Utc>) -> Result<FilterSpec> {
    let text = match (&filter.query, &filter.pattern) {
        (Some(_), Some(_)) => {
            return Err(Error::validation(
                "query/pattern",
                "'query' and 'pattern' are mutually exclusive; use 'query' for a plain substring \
                 search or 'pattern' for a regular expression, not both",
            ));
        }
        (Some(query), None) => Some(TextMatch::Substring(query.to_lowercase())),
        (None, Some(pattern)) => {
            let regex = Regex::new(pattern).map_err(|e| Error::validation("pattern", e.to_string()))?;
            Some(TextMatch::Pattern(regex))
        }
        (None, None) => None,
    };

    let after = filter.after.as_deref().map(|value| parse_timestamp("after", value)).transpose()?;
    let before = filter.before.as_deref().map(|value| parse_timestamp("before", value)).transpose()?;

    let since = match filter.days_back {
        Some(days) => Some(days_back_bound(now, days).ok_or_else(|| {
            Error::validation("days_back", format!("{days} days back is outside the supported date range"))
        })?),
        None => None,
    };

    let limit = match filter.limit {
        Some(0) => return Err(Error::validation("limit", "must be at least 1")),
        Some(limit) => limit,
        None => DEFAULT_LIMIT,
    };

    Ok(FilterSpec { text, after, before, since, limit })
}

/// Parse `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS` as UTC; a bare date means midnight
pub fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();

    if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, DATETIME_FORMAT) {
        return Ok(datetime.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        && let Some(midnight) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(midnight.and_utc());
    }

    Err(Error::validation(
        field,
        format!("'{value}' is not a valid date; expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS"),
    ))
}
