use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Chromium-family browsers whose profile layout we understand.
///
/// The declaration order is the auto-detection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    Brave,
    Chrome,
    Chromium,
}

impl BrowserKind {
    pub const ALL: [BrowserKind; 3] = [BrowserKind::Brave, BrowserKind::Chrome, BrowserKind::Chromium];

    pub fn as_str(self) -> &'static str {
        match self {
            BrowserKind::Brave => "brave",
            BrowserKind::Chrome => "chrome",
            BrowserKind::Chromium => "chromium",
        }
    }

    /// Best-effort guess from a profile path, used when the caller supplies a bare path
    pub fn infer_from_path(path: &Path) -> BrowserKind {
        let lower = path.to_string_lossy().to_lowercase();
        if lower.contains("brave") {
            BrowserKind::Brave
        } else if lower.contains("google-chrome") || lower.contains("google/chrome") || lower.contains("google\\chrome") {
            BrowserKind::Chrome
        } else {
            BrowserKind::Chromium
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowserKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "brave" | "brave-browser" => Ok(BrowserKind::Brave),
            "chrome" | "google-chrome" => Ok(BrowserKind::Chrome),
            "chromium" | "chromium-browser" => Ok(BrowserKind::Chromium),
            _ => Err(Error::UnknownBrowser(s.to_string())),
        }
    }
}

/// A resolved profile directory (e.g. `~/.config/google-chrome/Default`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileHandle {
    pub root_path: PathBuf,
    pub browser_kind: BrowserKind,
}

impl ProfileHandle {
    pub fn new(root_path: impl Into<PathBuf>, browser_kind: BrowserKind) -> Self {
        Self { root_path: root_path.into(), browser_kind }
    }

    pub fn history_path(&self) -> PathBuf {
        self.root_path.join("History")
    }

    pub fn bookmarks_path(&self) -> PathBuf {
        self.root_path.join("Bookmarks")
    }

    pub fn sync_store_path(&self) -> PathBuf {
        self.root_path.join("Sync Data").join("LevelDB")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root_path.join("Sessions")
    }
}
