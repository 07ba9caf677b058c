use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::models::BrowserKind;

/// Name of the history store inside a profile directory; its presence marks a profile.
pub const HISTORY_FILE: &str = "History";

/// Base directories that browser installs hang off.
///
/// Held explicitly (instead of calling `dirs` at each probe) so detection can be
/// pointed at a fixture tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallRoots {
    /// `~/.config` on Linux, `~/Library/Application Support` on macOS
    pub config_dir: Option<PathBuf>,
    /// `%LOCALAPPDATA%` on Windows
    pub local_data_dir: Option<PathBuf>,
}

impl InstallRoots {
    pub fn from_system() -> Self {
        Self { config_dir: dirs::config_dir(), local_data_dir: dirs::data_local_dir() }
    }

    /// Both roots at the same directory; convenient for fixtures
    pub fn at(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self { config_dir: Some(base.clone()), local_data_dir: Some(base) }
    }

    /// The browser's "User Data" directory, which holds `Default`, `Profile 1`, ...
    pub fn user_data_dir(&self, kind: BrowserKind) -> Option<PathBuf> {
        if cfg!(target_os = "windows") {
            let base = self.local_data_dir.as_ref()?;
            let vendor = match kind {
                BrowserKind::Brave => base.join("BraveSoftware").join("Brave-Browser"),
                BrowserKind::Chrome => base.join("Google").join("Chrome"),
                BrowserKind::Chromium => base.join("Chromium"),
            };
            Some(vendor.join("User Data"))
        } else if cfg!(target_os = "macos") {
            let base = self.config_dir.as_ref()?;
            Some(match kind {
                BrowserKind::Brave => base.join("BraveSoftware").join("Brave-Browser"),
                BrowserKind::Chrome => base.join("Google").join("Chrome"),
                BrowserKind::Chromium => base.join("Chromium"),
            })
        } else {
            let base = self.config_dir.as_ref()?;
            Some(match kind {
                BrowserKind::Brave => base.join("BraveSoftware").join("Brave-Browser"),
                BrowserKind::Chrome => base.join("google-chrome"),
                BrowserKind::Chromium => base.join("chromium"),
            })
        }
    }
}

/// Profile directories under a user-data directory that contain a history store,
/// `Default` first, then `Profile N` in numeric order
///
/// Only checks paths for existence; never opens a file.
pub fn profile_dirs(user_data_dir: &Path) -> Vec<PathBuf> {
    let mut found: Vec<(u32, PathBuf)> = WalkDir::new(user_data_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .filter_map(|entry| {
            let rank = profile_rank(&entry.file_name().to_string_lossy())?;
            Some((rank, entry.into_path()))
        })
        .filter(|(_, path)| path.join(HISTORY_FILE).is_file())
        .collect();

    found.sort();
    found.into_iter().map(|(_, path)| path).collect()
}

fn profile_rank(name: &str) -> Option<u32> {
    if name == "Default" {
        return Some(0);
    }
    let number: u32 = name.strip_prefix("Profile ")?.parse().ok()?;
    Some(number.saturating_add(1))
}
