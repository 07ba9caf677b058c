use std::path::PathBuf;

use thiserror::Error;

use crate::models::ProfileHandle;

/// Errors surfaced to callers of the library.
///
/// Every message is meant to be shown to the caller as-is, so variants carry enough
/// context (field names, accepted formats, probed paths) to correct the request.
/// A single malformed sync record is never an error; see
/// [`Decoded::Skip`](crate::parsers::sync_records::Decoded).
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid value for '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("no browser profile found (searched: {})", display_paths(.searched))]
    ProfileNotFound { searched: Vec<PathBuf> },

    #[error(
        "multiple browser profiles found ({}); select one with select_browser",
        display_candidates(.candidates)
    )]
    AmbiguousProfile { candidates: Vec<ProfileHandle> },

    #[error("history store {} is locked by another process (gave up after {attempts} attempts)", .path.display())]
    ProfileLocked { path: PathBuf, attempts: u32 },

    #[error("history store {} is unavailable: {reason}", .path.display())]
    HistoryUnavailable { path: PathBuf, reason: String },

    #[error("sync store {} is unavailable: {reason}", .path.display())]
    SyncStoreUnavailable { path: PathBuf, reason: String },

    #[error("session file {} is unavailable: {reason}", .path.display())]
    SessionUnavailable { path: PathBuf, reason: String },

    #[error("unknown browser '{0}' (expected one of: brave, chrome, chromium)")]
    UnknownBrowser(String),

    #[error("config file {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("bookmarks file {} is malformed: {source}", .path.display())]
    Bookmarks {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), message: message.into() }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "nothing".to_string();
    }
    paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
}

fn display_candidates(candidates: &[ProfileHandle]) -> String {
    candidates
        .iter()
        .map(|c| format!("{}: {}", c.browser_kind, c.root_path.display()))
        .collect::<Vec<_>>()
        .join(", ")
}
