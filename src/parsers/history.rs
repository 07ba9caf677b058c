//! Read-only queries against the browser's `History` SQLite database.
//!
//! # Locking
//!
//! The browser keeps `History` open and may hold an exclusive lock while it writes.
//! Every query opens the file fresh through a `mode=ro` URI with a zero busy
//! timeout and retries `SQLITE_BUSY`/`SQLITE_LOCKED` with exponential backoff
//! ([`ReadSettings::retry_policy`]). When the retries run out the query fails with
//! [`Error::ProfileLocked`], or, with `snapshot_on_lock`, runs against a private copy
//! of the file and its journal.
//!
//! # Streaming
//!
//! Time bounds go into SQL as storage-epoch integers. There is no SQL `LIMIT`: rows
//! stream out of the cursor, text predicates and timestamp conversion are applied in
//! Rust, and reading stops as soon as `limit` rows were accepted. A row that cannot
//! be converted never takes a slot from a valid one.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use rusqlite::{Connection, ErrorCode, OpenFlags, Row, params_from_iter};
use tracing::{debug, warn};

use crate::config::ReadSettings;
use crate::error::{Error, Result};
use crate::filters::{FilterSpec, HistoryFilter, parse_filter};
use crate::models::{HistoryEntry, ProfileHandle};
use crate::utils::epoch::{from_storage_epoch, to_storage_epoch};
use crate::utils::paths::sqlite_read_only_uri;
use crate::utils::retry::{Exhausted, with_backoff};
use crate::utils::snapshot::snapshot_file;

const SIDECAR_SUFFIXES: &[&str] = &["-wal", "-journal"];

/// Validate `filter` and run it against the profile's history
///
/// Validation happens before the database is opened, so an invalid filter never
/// reads a row.
pub fn query_history(profile: &ProfileHandle, filter: &HistoryFilter, settings: &ReadSettings) -> Result<Vec<HistoryEntry>> {
    let spec = parse_filter(filter, Utc::now())?;
    HistoryStore::new(profile.history_path(), *settings).query(&spec)
}

/// Handle on one `History` file; holds no connection between queries.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    settings: ReadSettings,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>, settings: ReadSettings) -> Self {
        Self { path: path.into(), settings }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run a validated filter, newest visit first
    pub fn query(&self, spec: &FilterSpec) -> Result<Vec<HistoryEntry>> {
        if !self.path.is_file() {
            return Err(Error::HistoryUnavailable { path: self.path.clone(), reason: "file not found".to_string() });
        }

        let policy = self.settings.retry_policy();
        let attempt = with_backoff(&policy, is_lock_contention, || {
            let conn = open_read_only(&self.path)?;
            run_query(&conn, spec)
        });

        match attempt {
            Ok(entries) => Ok(entries),
            Err(Exhausted { attempts, transient: true, .. }) if self.settings.snapshot_on_lock => {
                warn!("{} still locked after {} attempts, querying a snapshot", self.path.display(), attempts);
                self.query_snapshot(spec)
            }
            Err(Exhausted { attempts, transient: true, .. }) => {
                Err(Error::ProfileLocked { path: self.path.clone(), attempts })
            }
            Err(Exhausted { last_error, .. }) => {
                Err(Error::HistoryUnavailable { path: self.path.clone(), reason: last_error.to_string() })
            }
        }
    }

    fn query_snapshot(&self, spec: &FilterSpec) -> Result<Vec<HistoryEntry>> {
        let (snapshot, copy) = snapshot_file(&self.path, SIDECAR_SUFFIXES).map_err(|e| Error::HistoryUnavailable {
            path: self.path.clone(),
            reason: format!("snapshot failed: {e}"),
        })?;
        // The copy is private, so it is opened writable to let SQLite replay a copied WAL.
        let conn = Connection::open_with_flags(&copy, OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX)?;
        let entries = run_query(&conn, spec)?;
        drop(conn);
        drop(snapshot);
        Ok(entries)
    }
}

fn is_lock_contention(err: &rusqlite::Error) -> bool {
    matches!(err.sqlite_error_code(), Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked))
}

fn open_read_only(path: &Path) -> rusqlite::Result<Connection> {
    let conn = Connection::open_with_flags(
        sqlite_read_only_uri(path),
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.busy_timeout(Duration::ZERO)?;
    // Opening is lazy; this first read is where a held lock surfaces.
    conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))?;
    Ok(conn)
}

fn has_table(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name=?1")?;
    let mut rows = stmt.query([name])?;
    Ok(rows.next()?.is_some())
}

fn build_sql(spec: &FilterSpec) -> (String, Vec<i64>) {
    let mut sql = String::from("SELECT url, title, last_visit_time, visit_count FROM urls");
    let mut clauses = Vec::new();
    let mut params = Vec::new();

    if let Some(lower) = spec.lower_bound() {
        clauses.push("last_visit_time >= ?");
        params.push(to_storage_epoch(lower));
    }
    if let Some(upper) = spec.upper_bound() {
        clauses.push("last_visit_time < ?");
        params.push(to_storage_epoch(upper));
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY last_visit_time DESC, id DESC");

    (sql, params)
}

fn run_query(conn: &Connection, spec: &FilterSpec) -> rusqlite::Result<Vec<HistoryEntry>> {
    if !has_table(conn, "urls")? {
        debug!("history database has no urls table");
        return Ok(Vec::new());
    }

    let (sql, params) = build_sql(spec);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(params.iter()))?;

    let mut entries = Vec::new();
    let mut examined = 0usize;
    while entries.len() < spec.limit
        && let Some(row) = rows.next()?
    {
        examined += 1;
        let Some(entry) = map_row(row)? else {
            continue;
        };
        if spec.accepts(&entry.url, &entry.title, entry.visit_time) {
            entries.push(entry);
        }
    }

    debug!("history query matched {} of {} rows examined", entries.len(), examined);
    Ok(entries)
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<Option<HistoryEntry>> {
    let url: Option<String> = row.get(0)?;
    let title: Option<String> = row.get(1)?;
    let last_visit_time: Option<i64> = row.get(2)?;
    let visit_count: Option<i64> = row.get(3)?;

    let Some(visit_time) = last_visit_time.and_then(from_storage_epoch) else {
        debug!("skipping history row with unrepresentable timestamp {:?}", last_visit_time);
        return Ok(None);
    };

    Ok(Some(HistoryEntry {
        url: url.unwrap_or_default(),
        title: title.unwrap_or_default(),
        visit_time,
        visit_count: visit_count.filter(|c| *c > 0).map(|c| u32::try_from(c).unwrap_or(u32::MAX)).unwrap_or(0),
    }))
}
