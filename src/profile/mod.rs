//! Browser profile discovery.
//!
//! Resolution never opens a file: it only checks that directories exist and that a
//! profile directory contains a `History` store.

pub mod locator;
pub mod platform;

pub use locator::{ProfileLocator, Resolution};
pub use platform::{HISTORY_FILE, InstallRoots, profile_dirs};
