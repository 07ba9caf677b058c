//! Tool dispatcher: the request/response surface used by the `serve` loop.
//!
//! A [`ToolSession`] lives for one process. It remembers the profile selected
//! during the session and offers the candidates again when detection was
//! ambiguous. Every tool call reads its files fresh.

use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::filters::{HistoryFilter, parse_filter};
use crate::models::{BrowserKind, ProfileHandle};
use crate::parsers::{HistoryStore, flatten, load_bookmarks, read_local_tabs, search};
use crate::profile::{InstallRoots, ProfileLocator, Resolution};
use crate::sync::read_synced_tabs;

/// One tool invocation: `{"tool": "<name>", "arguments": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", content = "arguments", rename_all = "snake_case")]
pub enum ToolRequest {
    SelectBrowser {
        browser: String,
        #[serde(default)]
        save_default: bool,
    },
    SetProfilePath {
        path: PathBuf,
        #[serde(default)]
        save_default: bool,
    },
    GetTabsAllDevices {},
    GetTabsLocal {},
    GetHistory(HistoryFilter),
    GetBookmarks {
        #[serde(default)]
        folder: Option<String>,
    },
    SearchBookmarks {
        query: String,
    },
    ListProfiles {},
}

impl ToolRequest {
    /// Parse a request, treating absent or `null` arguments as `{}`
    pub fn from_json(mut value: Value) -> Result<Self> {
        if let Some(object) = value.as_object_mut() {
            let missing = object.get("arguments").is_none_or(Value::is_null);
            if missing {
                object.insert("arguments".to_string(), json!({}));
            }
        }
        serde_json::from_value(value).map_err(|e| Error::validation("request", e.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolRequest::SelectBrowser { .. } => "select_browser",
            ToolRequest::SetProfilePath { .. } => "set_profile_path",
            ToolRequest::GetTabsAllDevices {} => "get_tabs_all_devices",
            ToolRequest::GetTabsLocal {} => "get_tabs_local",
            ToolRequest::GetHistory(_) => "get_history",
            ToolRequest::GetBookmarks { .. } => "get_bookmarks",
            ToolRequest::SearchBookmarks { .. } => "search_bookmarks",
            ToolRequest::ListProfiles {} => "list_profiles",
        }
    }
}

/// Per-process state for a sequence of tool calls.
#[derive(Debug, Clone)]
pub struct ToolSession {
    config: Config,
    config_path: Option<PathBuf>,
    roots: InstallRoots,
    override_path: Option<PathBuf>,
    resolution: Resolution,
    selected: Option<ProfileHandle>,
    pending: Vec<ProfileHandle>,
}

impl ToolSession {
    pub fn new(config: Config, config_path: Option<PathBuf>, roots: InstallRoots) -> Self {
        Self {
            config,
            config_path,
            roots,
            override_path: None,
            resolution: Resolution::Unique,
            selected: None,
            pending: Vec::new(),
        }
    }

    /// How to resolve several detected browsers; interactive sessions keep `Unique`
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Explicit profile directory that takes precedence over saved preferences
    pub fn with_override(mut self, path: Option<PathBuf>) -> Self {
        self.override_path = path;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn selected(&self) -> Option<&ProfileHandle> {
        self.selected.as_ref()
    }

    fn locator(&self) -> ProfileLocator {
        ProfileLocator::new(self.roots.clone()).with_override(self.override_path.clone()).with_saved(&self.config)
    }

    /// The profile tool calls read from, resolving (and remembering) it on first use
    pub fn profile(&mut self) -> Result<ProfileHandle> {
        if let Some(profile) = &self.selected {
            return Ok(profile.clone());
        }
        match self.locator().resolve(self.resolution) {
            Ok(profile) => {
                debug!("resolved profile {}", profile.root_path.display());
                self.selected = Some(profile.clone());
                Ok(profile)
            }
            Err(Error::AmbiguousProfile { candidates }) => {
                self.pending = candidates.clone();
                Err(Error::AmbiguousProfile { candidates })
            }
            Err(e) => Err(e),
        }
    }

    /// Run one tool and return its JSON result
    pub fn call(&mut self, request: ToolRequest) -> Result<Value> {
        debug!("tool call {}", request.name());
        match request {
            ToolRequest::SelectBrowser { browser, save_default } => {
                let kind: BrowserKind = browser.parse()?;
                let profile = match self.pending.iter().find(|p| p.browser_kind == kind) {
                    Some(candidate) => candidate.clone(),
                    None => self.locator().select(kind)?,
                };
                self.choose(profile, save_default)
            }
            ToolRequest::SetProfilePath { path, save_default } => {
                if !path.is_dir() {
                    return Err(Error::ProfileNotFound { searched: vec![path] });
                }
                let kind = BrowserKind::infer_from_path(&path);
                self.choose(ProfileHandle::new(path, kind), save_default)
            }
            ToolRequest::GetTabsAllDevices {} => {
                let profile = self.profile()?;
                Ok(serde_json::to_value(read_synced_tabs(&profile)?)?)
            }
            ToolRequest::GetTabsLocal {} => {
                let profile = self.profile()?;
                Ok(serde_json::to_value(read_local_tabs(&profile)?)?)
            }
            ToolRequest::GetHistory(filter) => {
                // Validate before resolving anything so a bad filter reads nothing.
                let spec = parse_filter(&filter, Utc::now())?;
                let profile = self.profile()?;
                let entries = HistoryStore::new(profile.history_path(), self.config.read).query(&spec)?;
                Ok(serde_json::to_value(entries)?)
            }
            ToolRequest::GetBookmarks { folder } => {
                let profile = self.profile()?;
                let tree = load_bookmarks(&profile.bookmarks_path())?;
                Ok(serde_json::to_value(flatten(&tree, folder.as_deref()))?)
            }
            ToolRequest::SearchBookmarks { query } => {
                let profile = self.profile()?;
                let tree = load_bookmarks(&profile.bookmarks_path())?;
                Ok(serde_json::to_value(search(&tree, &query))?)
            }
            ToolRequest::ListProfiles {} => Ok(serde_json::to_value(self.locator().detect_all())?),
        }
    }

    fn choose(&mut self, profile: ProfileHandle, save_default: bool) -> Result<Value> {
        let mut saved = false;
        if save_default {
            let path = self.config_path.clone().ok_or_else(|| Error::Config {
                path: PathBuf::new(),
                message: "no location for the preference file on this platform".to_string(),
            })?;
            self.config.remember(&profile);
            self.config.save(&path)?;
            saved = true;
        }

        info!("selected {} profile at {}", profile.browser_kind, profile.root_path.display());
        let response = json!({
            "browser": profile.browser_kind,
            "profile_path": profile.root_path,
            "saved": saved,
        });
        self.pending.clear();
        self.selected = Some(profile);
        Ok(response)
    }

    /// Handle one line of the `serve` protocol; never fails, errors become responses
    pub fn handle_line(&mut self, line: &str) -> Value {
        let outcome = serde_json::from_str::<Value>(line)
            .map_err(|e| Error::validation("request", e.to_string()))
            .and_then(ToolRequest::from_json)
            .and_then(|request| self.call(request));

        match outcome {
            Ok(result) => json!({ "ok": true, "result": result }),
            Err(e) => json!({ "ok": false, "error": e.to_string() }),
        }
    }
}
