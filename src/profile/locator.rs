use std::path::PathBuf;

use tracing::{debug, warn};

use super::platform::{InstallRoots, profile_dirs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{BrowserKind, ProfileHandle};

/// What to do when auto-detection finds more than one browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Take the first browser in priority order (brave, chrome, chromium)
    FirstMatch,
    /// Refuse to pick; the caller has to select a browser explicitly
    Unique,
}

/// Resolves which profile directory to read.
///
/// Precedence, first match wins:
/// 1. explicit override (argument or `CHROMIUM_PROFILE_PATH`)
/// 2. saved preference (path, or browser kind)
/// 3. auto-detection over the standard install locations
#[derive(Debug, Clone, Default)]
pub struct ProfileLocator {
    override_path: Option<PathBuf>,
    saved_browser: Option<BrowserKind>,
    saved_path: Option<PathBuf>,
    roots: InstallRoots,
}

impl ProfileLocator {
    pub fn new(roots: InstallRoots) -> Self {
        Self { roots, ..Self::default() }
    }

    pub fn with_override(mut self, path: Option<PathBuf>) -> Self {
        self.override_path = path;
        self
    }

    pub fn with_saved(mut self, config: &Config) -> Self {
        self.saved_browser = config.browser;
        self.saved_path = config.profile_path.clone();
        self
    }

    /// Every detected profile of every supported browser, in priority order
    pub fn detect_all(&self) -> Vec<ProfileHandle> {
        BrowserKind::ALL
            .iter()
            .filter_map(|kind| self.roots.user_data_dir(*kind).map(|dir| (*kind, dir)))
            .flat_map(|(kind, dir)| profile_dirs(&dir).into_iter().map(move |p| ProfileHandle::new(p, kind)))
            .collect()
    }

    /// The preferred profile of one browser, if it is installed
    pub fn detect(&self, kind: BrowserKind) -> Option<ProfileHandle> {
        let user_data = self.roots.user_data_dir(kind)?;
        profile_dirs(&user_data).into_iter().next().map(|path| ProfileHandle::new(path, kind))
    }

    /// One profile per installed browser, in priority order
    pub fn detect_browsers(&self) -> Vec<ProfileHandle> {
        BrowserKind::ALL.iter().filter_map(|kind| self.detect(*kind)).collect()
    }

    /// Select a specific browser's profile
    pub fn select(&self, kind: BrowserKind) -> Result<ProfileHandle> {
        self.detect(kind).ok_or_else(|| Error::ProfileNotFound {
            searched: self.roots.user_data_dir(kind).into_iter().collect(),
        })
    }

    pub fn resolve(&self, resolution: Resolution) -> Result<ProfileHandle> {
        if let Some(path) = &self.override_path {
            if path.is_dir() {
                debug!("using profile override {}", path.display());
                return Ok(ProfileHandle::new(path.clone(), BrowserKind::infer_from_path(path)));
            }
            return Err(Error::ProfileNotFound { searched: vec![path.clone()] });
        }

        if let Some(saved) = self.resolve_saved() {
            return Ok(saved);
        }

        let candidates = self.detect_browsers();
        if resolution == Resolution::Unique && candidates.len() > 1 {
            return Err(Error::AmbiguousProfile { candidates });
        }
        candidates.into_iter().next().ok_or_else(|| Error::ProfileNotFound { searched: self.probed_paths() })
    }

    fn resolve_saved(&self) -> Option<ProfileHandle> {
        if let Some(path) = &self.saved_path {
            if path.is_dir() {
                let kind = self.saved_browser.unwrap_or_else(|| BrowserKind::infer_from_path(path));
                debug!("using saved profile {}", path.display());
                return Some(ProfileHandle::new(path.clone(), kind));
            }
            warn!("saved profile {} no longer exists, falling back to detection", path.display());
        }

        if let Some(kind) = self.saved_browser {
            match self.detect(kind) {
                Some(profile) => return Some(profile),
                None => warn!("saved browser {kind} is not installed, falling back to detection"),
            }
        }

        None
    }

    fn probed_paths(&self) -> Vec<PathBuf> {
        BrowserKind::ALL.iter().filter_map(|kind| self.roots.user_data_dir(*kind)).collect()
    }
}
