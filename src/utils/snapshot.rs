use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;
use walkdir::WalkDir;

/// A private copy of browser files, deleted when dropped.
///
/// The browser keeps its stores open (and LevelDB keeps a `LOCK` file), so the
/// engines read from a copy whenever opening the original would need a lock.
#[derive(Debug)]
pub struct Snapshot {
    dir: TempDir,
}

impl Snapshot {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// Copy every regular file directly inside `source` except those named in `skip`
///
/// Files that disappear between listing and copying (LevelDB compaction deletes
/// old tables) are skipped; any other I/O failure aborts the snapshot.
pub fn snapshot_dir(source: &Path, skip: &[&str]) -> io::Result<Snapshot> {
    let dir = TempDir::new()?;
    let mut copied = 0usize;

    for entry in WalkDir::new(source).min_depth(1).max_depth(1) {
        let entry = entry.map_err(io::Error::other)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if skip.iter().any(|s| *s == name) {
            continue;
        }
        match fs::copy(entry.path(), dir.path().join(entry.file_name())) {
            Ok(_) => copied += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{} vanished while copying, skipping", entry.path().display());
            }
            Err(e) => return Err(e),
        }
    }

    debug!("snapshot of {} ({} files) at {}", source.display(), copied, dir.path().display());
    Ok(Snapshot { dir })
}

/// Copy a single file plus any of its sidecar files (`-wal`, `-journal`) that exist
pub fn snapshot_file(source: &Path, sidecar_suffixes: &[&str]) -> io::Result<(Snapshot, PathBuf)> {
    let dir = TempDir::new()?;
    let file_name = source
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "snapshot source has no file name"))?;
    let target = dir.path().join(file_name);
    fs::copy(source, &target)?;

    for suffix in sidecar_suffixes {
        let mut sidecar = source.as_os_str().to_owned();
        sidecar.push(suffix);
        let sidecar = PathBuf::from(sidecar);
        if sidecar.is_file() {
            let mut dest = target.as_os_str().to_owned();
            dest.push(suffix);
            fs::copy(&sidecar, PathBuf::from(dest))?;
        }
    }

    Ok((Snapshot { dir }, target))
}
