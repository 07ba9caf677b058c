//! Records returned by the query engines.
//!
//! - [`HistoryEntry`] - one row of the browser's URL history
//! - [`DeviceSession`] / [`SyncedTab`] - reconstructed cross-device tab state
//! - [`LocalTab`] - an open tab of the local browser session
//! - [`BookmarkEntry`] - a flattened bookmark or bookmark folder
//! - [`ProfileHandle`] / [`BrowserKind`] - a resolved browser profile
//!
//! All records serialize with serde; timestamps serialize as RFC 3339 strings.

pub mod bookmark;
pub mod history;
pub mod profile;
pub mod tabs;

pub use bookmark::BookmarkEntry;
pub use history::HistoryEntry;
pub use profile::{BrowserKind, ProfileHandle};
pub use tabs::{DeviceSession, DeviceType, LocalTab, SyncedTab};
