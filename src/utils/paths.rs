use std::fs::File;
use std::io;
use std::path::Path;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

// Characters that would otherwise be read as URI syntax by SQLite's URI parser
const URI_ENCODE_SET: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'#').add(b'%').add(b'?').add(b'<').add(b'>');

/// Builds a read-only SQLite URI for a database file
///
/// `mode=ro` makes SQLite refuse any write, including journal recovery, so the
/// browser's own copy of the file is never touched.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use chromium_sync::utils::sqlite_read_only_uri;
///
/// let uri = sqlite_read_only_uri(Path::new("/home/a/My Profile/History"));
/// assert_eq!(uri, "file:/home/a/My%20Profile/History?mode=ro");
/// ```
pub fn sqlite_read_only_uri(path: &Path) -> String {
    let path_str = path.to_string_lossy();
    // SQLite URIs always use forward slashes; Windows drive paths need a leading one.
    let normalized = if cfg!(windows) {
        let forward = path_str.replace('\\', "/");
        if forward.starts_with('/') { forward } else { format!("/{}", forward) }
    } else {
        path_str.into_owned()
    };
    format!("file:{}?mode=ro", utf8_percent_encode(&normalized, URI_ENCODE_SET))
}

/// Validates that a file's size is within `max_bytes`
///
/// Takes an open file handle to avoid TOCTOU (time-of-check-time-of-use)
/// races where the file could be swapped between the size check and the read.
pub fn validate_file_size(file: &File, path: &Path, max_bytes: u64) -> io::Result<()> {
    let file_size = file.metadata()?.len();
    if file_size > max_bytes {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("file too large: {} ({} bytes, max {} bytes)", path.display(), file_size, max_bytes),
        ));
    }
    Ok(())
}
