//! Persisted preferences: the last selected browser/profile and read settings.
//!
//! Stored as JSON, by default at:
//! - Linux: `~/.config/chromium-sync/config.json`
//! - macOS: `~/Library/Application Support/chromium-sync/config.json`
//! - Windows: `%APPDATA%\chromium-sync\config.json`
//!
//! The file is loaded fresh at call time and only written on an explicit selection,
//! through a temp file + rename so readers never see a half-written file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{BrowserKind, ProfileHandle};
use crate::utils::RetryPolicy;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<BrowserKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_path: Option<PathBuf>,
    #[serde(default)]
    pub read: ReadSettings,
}

/// How the engines deal with stores the browser holds open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadSettings {
    pub lock_retries: u32,
    pub lock_backoff_ms: u64,
    /// Query a private copy of the history file when it stays locked
    pub snapshot_on_lock: bool,
}

impl Default for ReadSettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            lock_retries: policy.retries,
            lock_backoff_ms: policy.initial_backoff.as_millis() as u64,
            snapshot_on_lock: false,
        }
    }
}

impl ReadSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.lock_retries, Duration::from_millis(self.lock_backoff_ms))
    }
}

impl Config {
    /// Load the config, treating a missing file as defaults
    pub fn load(path: &Path) -> Result<Self> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(config_error(path, format!("failed to read: {e}"))),
        };

        serde_json::from_str(&json).map_err(|e| config_error(path, format!("failed to parse: {e}")))
    }

    /// Record a selection as the saved default
    pub fn remember(&mut self, profile: &ProfileHandle) {
        self.browser = Some(profile.browser_kind);
        self.profile_path = Some(profile.root_path.clone());
    }

    /// Write the config atomically (temp file + rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|e| config_error(path, format!("failed to create directory: {e}")))?;
        }

        let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let temp = path.with_file_name(format!("{}.tmp", file_name));
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&temp, json).map_err(|e| config_error(path, format!("failed to write temp file: {e}")))?;
        fs::rename(&temp, path).map_err(|e| config_error(path, format!("failed to replace: {e}")))?;

        debug!("saved config to {}", path.display());
        Ok(())
    }
}

fn config_error(path: &Path, message: String) -> Error {
    Error::Config { path: path.to_path_buf(), message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.read.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.remember(&ProfileHandle::new("/home/a/.config/chromium/Default", BrowserKind::Chromium));
        config.read.snapshot_on_lock = true;
        config.save(&path).unwrap();

        assert!(!dir.path().join("nested").join("config.json.tmp").exists());
        let reloaded = Config::load(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"browser":"brave","read":{"lock_retries":7}}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.browser, Some(BrowserKind::Brave));
        assert_eq!(config.profile_path, None);
        assert_eq!(config.read.lock_retries, 7);
        assert_eq!(config.read.lock_backoff_ms, 50);
        assert!(!config.read.snapshot_on_lock);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("failed to parse"));
    }
}
