//! Reader for the browser's local session command log (`SNSS` files).
//!
//! A session file is a header (`SNSS` magic plus an `i32` version) followed by
//! commands, each `u16 size | u8 id | payload` where `size` counts the id byte.
//! Replaying the commands that place tabs in windows, record navigations and track
//! closures yields the currently open tabs.
//!
//! Versions 2 and 4 are encrypted and cannot be read. A truncated tail (the browser
//! appends while running) ends the replay; a malformed single command is skipped.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::{self, File};
use std::io::Read;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{LocalTab, ProfileHandle};
use crate::utils::paths::validate_file_size;

const MAGIC: &[u8; 4] = b"SNSS";
const MAX_SESSION_FILE_BYTES: u64 = 256 * 1024 * 1024;
const SESSION_FILE_PREFIX: &str = "Session_";
const LEGACY_SESSION_FILE: &str = "Current Session";

const CMD_SET_TAB_WINDOW: u8 = 0;
const CMD_SET_TAB_INDEX_IN_WINDOW: u8 = 2;
const CMD_UPDATE_TAB_NAVIGATION: u8 = 6;
const CMD_SET_SELECTED_NAVIGATION_INDEX: u8 = 7;
const CMD_TAB_CLOSED: u8 = 16;
const CMD_WINDOW_CLOSED: u8 = 17;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionFormatError {
    #[error("file is too short for a session header")]
    TooShort,

    #[error("not a session file (bad magic)")]
    BadMagic,

    #[error("session file version {0} is encrypted")]
    Encrypted(i32),

    #[error("unsupported session file version {0}")]
    UnsupportedVersion(i32),
}

/// The session file the browser wrote last, if any
pub fn latest_session_file(profile: &ProfileHandle) -> Option<PathBuf> {
    let sessions_dir = profile.sessions_dir();
    let newest = fs::read_dir(&sessions_dir)
        .ok()
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            let stamp = name.strip_prefix(SESSION_FILE_PREFIX)?.parse::<u64>().ok()?;
            entry.path().is_file().then(|| (stamp, entry.path()))
        })
        .max_by_key(|(stamp, _)| *stamp)
        .map(|(_, path)| path);

    newest.or_else(|| {
        let legacy = profile.root_path.join(LEGACY_SESSION_FILE);
        legacy.is_file().then_some(legacy)
    })
}

/// Open tabs of the local browser, ordered by window then position in the window
pub fn read_local_tabs(profile: &ProfileHandle) -> Result<Vec<LocalTab>> {
    let path = latest_session_file(profile).ok_or_else(|| Error::SessionUnavailable {
        path: profile.sessions_dir(),
        reason: "no session file found".to_string(),
    })?;

    let mut file = File::open(&path)?;
    validate_file_size(&file, &path, MAX_SESSION_FILE_BYTES)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let tabs = parse_session(&bytes)
        .map_err(|e| Error::SessionUnavailable { path: path.clone(), reason: e.to_string() })?;
    debug!("{} open tabs in {}", tabs.len(), path.display());
    Ok(tabs)
}

#[derive(Default)]
struct Replay {
    tab_window: HashMap<i32, i32>,
    tab_index: HashMap<i32, i32>,
    navigations: HashMap<i32, BTreeMap<i32, (String, String)>>,
    selected: HashMap<i32, i32>,
    closed_tabs: HashSet<i32>,
    closed_windows: HashSet<i32>,
}

impl Replay {
    fn apply(&mut self, id: u8, payload: &[u8]) -> Option<()> {
        match id {
            CMD_SET_TAB_WINDOW => {
                let window = read_i32(payload, 0)?;
                let tab = read_i32(payload, 4)?;
                self.tab_window.insert(tab, window);
            }
            CMD_SET_TAB_INDEX_IN_WINDOW => {
                let tab = read_i32(payload, 0)?;
                let index = read_i32(payload, 4)?;
                self.tab_index.insert(tab, index);
            }
            CMD_UPDATE_TAB_NAVIGATION => {
                let mut pickle = PickleReader::new(payload)?;
                let tab = pickle.read_i32()?;
                let index = pickle.read_i32()?;
                let url = pickle.read_string()?;
                let title = pickle.read_string16()?;
                self.navigations.entry(tab).or_default().insert(index, (url, title));
            }
            CMD_SET_SELECTED_NAVIGATION_INDEX => {
                let tab = read_i32(payload, 0)?;
                let index = read_i32(payload, 4)?;
                self.selected.insert(tab, index);
            }
            CMD_TAB_CLOSED => {
                self.closed_tabs.insert(read_i32(payload, 0)?);
            }
            CMD_WINDOW_CLOSED => {
                self.closed_windows.insert(read_i32(payload, 0)?);
            }
            _ => {}
        }
        Some(())
    }

    fn into_tabs(self) -> Vec<LocalTab> {
        let mut tabs: Vec<(i32, LocalTab)> = self
            .navigations
            .iter()
            .filter(|(tab_id, _)| !self.closed_tabs.contains(*tab_id))
            .filter_map(|(tab_id, navs)| {
                let window_id = *self.tab_window.get(tab_id)?;
                if self.closed_windows.contains(&window_id) {
                    return None;
                }
                let (url, title) = self
                    .selected
                    .get(tab_id)
                    .and_then(|idx| navs.get(idx))
                    .or_else(|| navs.values().next_back())?;
                let index = self.tab_index.get(tab_id).copied().unwrap_or(i32::MAX);
                Some((index, LocalTab { window_id, tab_id: *tab_id, url: url.clone(), title: title.clone() }))
            })
            .collect();

        tabs.sort_by_key(|(index, tab)| (tab.window_id, *index, tab.tab_id));
        tabs.into_iter().map(|(_, tab)| tab).collect()
    }
}

/// Replay a whole session file
pub fn parse_session(bytes: &[u8]) -> std::result::Result<Vec<LocalTab>, SessionFormatError> {
    if bytes.len() < 8 {
        return Err(SessionFormatError::TooShort);
    }
    if &bytes[..4] != MAGIC {
        return Err(SessionFormatError::BadMagic);
    }
    let version = read_i32(bytes, 4).ok_or(SessionFormatError::TooShort)?;
    match version {
        1 | 3 => {}
        2 | 4 => return Err(SessionFormatError::Encrypted(version)),
        other => return Err(SessionFormatError::UnsupportedVersion(other)),
    }

    let mut replay = Replay::default();
    let mut pos = 8;
    let mut malformed = 0usize;
    while pos + 2 <= bytes.len() {
        let size = usize::from(u16::from_le_bytes([bytes[pos], bytes[pos + 1]]));
        pos += 2;
        if size == 0 || pos + size > bytes.len() {
            debug!("session file ends in a partial command at byte {}", pos - 2);
            break;
        }
        let id = bytes[pos];
        let payload = &bytes[pos + 1..pos + size];
        pos += size;

        if replay.apply(id, payload).is_none() {
            malformed += 1;
        }
    }
    if malformed > 0 {
        debug!("skipped {malformed} malformed session commands");
    }

    Ok(replay.into_tabs())
}

fn read_i32(buf: &[u8], offset: usize) -> Option<i32> {
    let bytes = buf.get(offset..offset.checked_add(4)?)?;
    Some(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Cursor over a serialized pickle: a `u32` payload size, then 4-byte aligned fields
struct PickleReader<'a> {
    payload: &'a [u8],
    pos: usize,
}

impl<'a> PickleReader<'a> {
    fn new(buf: &'a [u8]) -> Option<Self> {
        let declared = usize::try_from(read_i32(buf, 0)?).ok()?;
        let payload = buf.get(4..)?;
        // Trust the smaller of the declared and actual size.
        let payload = &payload[..declared.min(payload.len())];
        Some(Self { payload, pos: 0 })
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let bytes = self.payload.get(self.pos..end)?;
        self.pos = end.checked_add(3)? & !3;
        Some(bytes)
    }

    fn read_i32(&mut self) -> Option<i32> {
        let bytes = self.take(4)?;
        Some(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_string(&mut self) -> Option<String> {
        let len = usize::try_from(self.read_i32()?).ok()?;
        Some(String::from_utf8_lossy(self.take(len)?).into_owned())
    }

    fn read_string16(&mut self) -> Option<String> {
        let chars = usize::try_from(self.read_i32()?).ok()?;
        let bytes = self.take(chars.checked_mul(2)?)?;
        let units: Vec<u16> = bytes.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]])).collect();
        Some(String::from_utf16_lossy(&units))
    }
}
