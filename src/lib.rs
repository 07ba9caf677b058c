//! chromium-sync - read-only access to a local Chromium-family browser profile
//!
//! This library reads the files a Brave, Chrome or Chromium profile keeps on disk,
//! while the browser may be running, without ever writing to them. It supports:
//!
//! - Locating the profile to read (override, saved preference, auto-detection)
//! - Filtered history queries against the `History` SQLite store
//! - Reconstructing the open tabs of every synced device from the sync LevelDB
//! - Listing the local browser's open tabs from its session command log
//! - Flattening and searching `Bookmarks`
//!
//! # Example
//!
//! ```no_run
//! use chromium_sync::config::ReadSettings;
//! use chromium_sync::filters::HistoryFilter;
//! use chromium_sync::profile::{InstallRoots, ProfileLocator, Resolution};
//! use chromium_sync::query_history;
//!
//! let profile = ProfileLocator::new(InstallRoots::from_system()).resolve(Resolution::FirstMatch)?;
//! let filter = HistoryFilter { query: Some("docs.rs".into()), days_back: Some(7), ..Default::default() };
//! for entry in query_history(&profile, &filter, &ReadSettings::default())? {
//!     println!("{} {}", entry.visit_time, entry.url);
//! }
//! # Ok::<(), chromium_sync::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod filters;
pub mod logging;
pub mod models;
pub mod parsers;
pub mod profile;
pub mod sync;
pub mod tools;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use models::{BookmarkEntry, BrowserKind, DeviceSession, HistoryEntry, LocalTab, ProfileHandle, SyncedTab};
pub use parsers::history::query_history;
pub use sync::read_synced_tabs;
pub use tools::{ToolRequest, ToolSession};
