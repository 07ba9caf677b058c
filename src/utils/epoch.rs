//! Conversion between Chromium's storage epoch and calendar time.
//!
//! Chromium stores timestamps as microseconds since `1601-01-01T00:00:00Z` (the
//! Windows FILETIME epoch). All arithmetic here is integer microseconds; nothing goes
//! through floating point, so conversions are exact across chrono's whole range.

use chrono::{DateTime, TimeDelta, Utc};

/// Microseconds between 1601-01-01 and 1970-01-01.
pub const STORAGE_EPOCH_OFFSET_MICROS: i64 = 11_644_473_600_000_000;

const MICROS_PER_SECOND: i64 = 1_000_000;

/// Calendar time → microseconds since 1601-01-01 UTC
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use chromium_sync::utils::epoch::to_storage_epoch;
///
/// let unix_epoch = DateTime::from_timestamp(0, 0).unwrap();
/// assert_eq!(to_storage_epoch(unix_epoch), 11_644_473_600_000_000);
/// ```
pub fn to_storage_epoch(ts: DateTime<Utc>) -> i64 {
    // chrono's range (±262k years) keeps this far from i64 overflow.
    ts.timestamp_micros() + STORAGE_EPOCH_OFFSET_MICROS
}

/// Microseconds since 1601-01-01 UTC → calendar time
///
/// Returns `None` only for values outside chrono's representable range.
pub fn from_storage_epoch(micros: i64) -> Option<DateTime<Utc>> {
    let unix_micros = micros.checked_sub(STORAGE_EPOCH_OFFSET_MICROS)?;
    let secs = unix_micros.div_euclid(MICROS_PER_SECOND);
    let nanos = (unix_micros.rem_euclid(MICROS_PER_SECOND) * 1_000) as u32;
    DateTime::from_timestamp(secs, nanos)
}

/// Lower bound for a `days_back` filter: `now - days`, truncated to whole seconds
pub fn days_back_bound(now: DateTime<Utc>, days: u32) -> Option<DateTime<Utc>> {
    let now = DateTime::from_timestamp(now.timestamp(), 0)?;
    now.checked_sub_signed(TimeDelta::try_days(i64::from(days))?)
}
