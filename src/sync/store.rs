use std::path::{Path, PathBuf};

use rusty_leveldb::{DB, LdbIterator, Options};
use tracing::debug;

use crate::error::{Error, Result};
use crate::utils::snapshot::{Snapshot, snapshot_dir};

/// LevelDB's inter-process lock; the browser holds it while running
const LOCK_FILE: &str = "LOCK";

/// A private, read-only view of a profile's sync store.
///
/// The browser holds the store's `LOCK` while it runs, so the store directory is
/// copied (without `LOCK`) and the copy is opened. The copy lives as long as this
/// value.
pub struct SyncStore {
    source: PathBuf,
    db: DB,
    // Dropped after `db`, removing the copy once nothing reads it.
    _snapshot: Snapshot,
}

impl SyncStore {
    pub fn open(store_dir: &Path) -> Result<Self> {
        let unavailable = |reason: String| Error::SyncStoreUnavailable { path: store_dir.to_path_buf(), reason };

        if !store_dir.is_dir() {
            return Err(unavailable("directory does not exist".to_string()));
        }

        let snapshot = snapshot_dir(store_dir, &[LOCK_FILE]).map_err(|e| unavailable(format!("copy failed: {e}")))?;

        let options = Options { create_if_missing: false, ..Options::default() };
        let db = DB::open(snapshot.path(), options).map_err(|e| unavailable(format!("cannot open: {e}")))?;

        debug!("opened sync store copy of {}", store_dir.display());
        Ok(Self { source: store_dir.to_path_buf(), db, _snapshot: snapshot })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Visit every live record once, in key order
    pub fn for_each_record(&mut self, mut visit: impl FnMut(&[u8], &[u8])) -> Result<usize> {
        let mut iter = self.db.new_iter().map_err(|e| Error::SyncStoreUnavailable {
            path: self.source.clone(),
            reason: format!("cannot iterate: {e}"),
        })?;

        let mut key = Vec::new();
        let mut value = Vec::new();
        let mut visited = 0;
        while iter.advance() {
            if iter.current(&mut key, &mut value) {
                visit(&key, &value);
                visited += 1;
            }
        }
        Ok(visited)
    }
}
