//! Synced tabs of every device signed in to the profile's account.
//!
//! The sync store is read from a private copy, decoded record by record, and
//! reconstructed into one [`DeviceSession`] per device. Corrupt or foreign records
//! are skipped and counted; only a store that cannot be opened at all is an error.

pub mod builder;
pub mod store;

use tracing::debug;

pub use builder::{SessionBuilder, UNKNOWN_DEVICE_ID, UNKNOWN_DEVICE_NAME};
pub use store::SyncStore;

use crate::error::Result;
use crate::models::{DeviceSession, ProfileHandle};

/// Open tabs of every synced device, most recently active device first
///
/// # Errors
///
/// Returns [`Error::SyncStoreUnavailable`](crate::Error::SyncStoreUnavailable) when the
/// store is missing or cannot be opened. A store that opens but holds neither named
/// devices nor tabs gives an empty list.
pub fn read_synced_tabs(profile: &ProfileHandle) -> Result<Vec<DeviceSession>> {
    let mut store = SyncStore::open(&profile.sync_store_path())?;
    let mut builder = SessionBuilder::new();
    let visited = store.for_each_record(|key, value| builder.ingest(key, value))?;
    debug!("scanned {} records from {}", visited, store.source().display());
    Ok(builder.finish())
}
