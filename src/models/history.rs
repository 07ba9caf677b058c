use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One URL from the history store, as of its most recent visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub url: String,
    pub title: String,
    pub visit_time: DateTime<Utc>,
    pub visit_count: u32,
}
