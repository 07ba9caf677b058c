use chrono::{DateTime, Utc};
use serde::de::Error;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::utils::epoch::from_storage_epoch;

/// Storage-epoch timestamp written as a decimal string (or, rarely, a number)
///
/// `"0"`, empty strings and values outside chrono's range become `None` instead of
/// failing the whole file; a bookmark without a usable date is still a bookmark.
pub fn deserialize_storage_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let micros = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => return Err(Error::custom("timestamp must be a string or number")),
    };
    Ok(micros.filter(|m| *m > 0).and_then(from_storage_epoch))
}

/// Node ids are strings in current files and numbers in some old ones
pub fn deserialize_node_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(Error::custom("bookmark id must be a non-empty string or number")),
    }
}
