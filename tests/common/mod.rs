//! Shared test utilities for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use chromium_sync::models::{BrowserKind, ProfileHandle};
use chromium_sync::parsers::sync_proto::{
    DeviceInfoSpecifics, EntityMetadata, SessionHeader, SessionSpecifics, SessionTab, SessionWindow, TabNavigation,
};
use chromium_sync::profile::InstallRoots;
use prost::Message;
use chromium_sync::utils::to_storage_epoch;
use rusqlite::{Connection, params};
use rusty_leveldb::{DB, Options};
use tempfile::TempDir;

/// Builder for fixture browser profiles: a History database, a Bookmarks file,
/// a sync store and session files, all under one temp directory
pub struct ProfileBuilder {
    temp_dir: TempDir,
    profile_dir: PathBuf,
    history: Vec<HistoryRow>,
    sync_records: Vec<(String, Vec<u8>)>,
}

impl ProfileBuilder {
    /// Create the `Default` profile of a Chromium install rooted at a temp directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let profile_dir = InstallRoots::at(temp_dir.path())
            .user_data_dir(BrowserKind::Chromium)
            .expect("install root has a user data dir")
            .join("Default");
        fs::create_dir_all(&profile_dir).expect("Failed to create profile dir");
        Self { temp_dir, profile_dir, history: Vec::new(), sync_records: Vec::new() }
    }

    /// Directory that holds the browser's user-data directory; use as an install root
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn profile_dir(&self) -> &Path {
        &self.profile_dir
    }

    /// Add one row to the `urls` table
    pub fn with_visit(mut self, row: HistoryRow) -> Self {
        self.history.push(row);
        self
    }

    /// Write a Bookmarks file with the given JSON content
    pub fn with_bookmarks(self, json: &str) -> Self {
        fs::write(self.profile_dir.join("Bookmarks"), json).expect("Failed to write Bookmarks");
        self
    }

    /// Add a raw sync store record
    pub fn with_sync_record(mut self, key: &str, value: Vec<u8>) -> Self {
        self.sync_records.push((key.to_string(), value));
        self
    }

    /// Add a session header for `guid` naming the device and listing open tab ids
    pub fn with_synced_device(self, guid: &str, name: &str, tab_ids: &[i32]) -> Self {
        let tag = format!("session_sync{guid}");
        let value = synced_header(&tag, name, tab_ids);
        self.with_sync_record(&format!("sessions-dt-{tag}"), value)
    }

    /// Add a synced tab of device `guid` showing `url`
    pub fn with_synced_tab(self, guid: &str, node: i32, tab_id: i32, url: &str, title: &str, ts_ms: i64) -> Self {
        let tag = format!("session_sync{guid}");
        let value = synced_tab(&tag, node, tab_id, url, title, ts_ms);
        self.with_sync_record(&format!("sessions-dt-{tag}-{node}"), value)
    }

    /// Write a session command file as `Sessions/Session_<stamp>`
    pub fn with_session_file(self, stamp: u64, writer: SessionFileWriter) -> Self {
        let dir = self.profile_dir.join("Sessions");
        fs::create_dir_all(&dir).expect("Failed to create Sessions dir");
        fs::write(dir.join(format!("Session_{stamp}")), writer.into_bytes()).expect("Failed to write session file");
        self
    }

    /// Write every pending store and return the fixture (consumes self)
    pub fn build(self) -> ProfileFixture {
        write_history(&self.profile_dir.join("History"), &self.history);
        if !self.sync_records.is_empty() {
            write_sync_store(&self.profile_dir.join("Sync Data").join("LevelDB"), &self.sync_records);
        }
        ProfileFixture { temp_dir: self.temp_dir, profile_dir: self.profile_dir }
    }
}

impl Default for ProfileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A built fixture profile; the files live as long as this value
pub struct ProfileFixture {
    temp_dir: TempDir,
    profile_dir: PathBuf,
}

impl ProfileFixture {
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn profile_dir(&self) -> &Path {
        &self.profile_dir
    }

    pub fn roots(&self) -> InstallRoots {
        InstallRoots::at(self.temp_dir.path())
    }

    pub fn handle(&self) -> ProfileHandle {
        ProfileHandle::new(&self.profile_dir, BrowserKind::Chromium)
    }
}

/// One row of the `urls` table
#[derive(Debug, Clone)]
pub struct HistoryRow {
    pub url: String,
    pub title: Option<String>,
    pub visit_time: DateTime<Utc>,
    pub visit_count: i64,
}

impl HistoryRow {
    pub fn new(url: &str, title: &str, visit_time: DateTime<Utc>) -> Self {
        Self { url: url.to_string(), title: Some(title.to_string()), visit_time, visit_count: 1 }
    }

    pub fn untitled(mut self) -> Self {
        self.title = None;
        self
    }

    pub fn visits(mut self, count: i64) -> Self {
        self.visit_count = count;
        self
    }
}

/// Noon UTC on the given day of January 2026
pub fn jan(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, day, 12, 0, 0).unwrap()
}

pub fn write_history(path: &Path, rows: &[HistoryRow]) {
    let conn = Connection::open(path).expect("Failed to create History");
    conn.execute_batch(
        "CREATE TABLE urls (id INTEGER PRIMARY KEY AUTOINCREMENT, url LONGVARCHAR, title LONGVARCHAR, \
         visit_count INTEGER DEFAULT 0 NOT NULL, typed_count INTEGER DEFAULT 0 NOT NULL, \
         last_visit_time INTEGER, hidden INTEGER DEFAULT 0 NOT NULL);",
    )
    .expect("Failed to create urls table");
    for row in rows {
        conn.execute(
            "INSERT INTO urls (url, title, last_visit_time, visit_count) VALUES (?1, ?2, ?3, ?4)",
            params![row.url, row.title, to_storage_epoch(row.visit_time), row.visit_count],
        )
        .expect("Failed to insert url row");
    }
}

pub fn write_sync_store(dir: &Path, records: &[(String, Vec<u8>)]) {
    fs::create_dir_all(dir).expect("Failed to create sync store dir");
    let options = Options { create_if_missing: true, ..Options::default() };
    let mut db = DB::open(dir, options).expect("Failed to create sync store");
    for (key, value) in records {
        db.put(key.as_bytes(), value).expect("Failed to write sync record");
    }
    db.flush().expect("Failed to flush sync store");
}

/// `SessionSpecifics` carrying a header
pub fn synced_header(tag: &str, name: &str, tab_ids: &[i32]) -> Vec<u8> {
    let window = if tab_ids.is_empty() {
        Vec::new()
    } else {
        vec![SessionWindow { tab: tab_ids.to_vec() }]
    };
    // device_type 3 = Linux
    let header = SessionHeader { window, client_name: Some(name.to_string()), device_type: Some(3) };
    SessionSpecifics { session_tag: Some(tag.to_string()), header: Some(header), ..SessionSpecifics::default() }
        .encode_to_vec()
}

/// `SessionSpecifics` carrying one tab with a single navigation
pub fn synced_tab(tag: &str, node: i32, tab_id: i32, url: &str, title: &str, ts_ms: i64) -> Vec<u8> {
    let nav = TabNavigation {
        virtual_url: Some(url.to_string()),
        title: Some(title.to_string()),
        timestamp_msec: Some(ts_ms),
    };
    let tab = SessionTab { tab_id: Some(tab_id), current_navigation_index: Some(0), navigation: vec![nav] };
    SessionSpecifics { session_tag: Some(tag.to_string()), header: None, tab: Some(tab), tab_node_id: Some(node) }
        .encode_to_vec()
}

/// `EntityMetadata` with a sequence number and tombstone flag
pub fn entity_metadata(sequence_number: i64, deleted: bool) -> Vec<u8> {
    EntityMetadata { is_deleted: Some(deleted), sequence_number: Some(sequence_number), ..EntityMetadata::default() }
        .encode_to_vec()
}

/// `DeviceInfoSpecifics` naming a phone
pub fn device_info(guid: &str, name: &str) -> Vec<u8> {
    DeviceInfoSpecifics { cache_guid: Some(guid.to_string()), client_name: Some(name.to_string()), device_type: Some(6) }
        .encode_to_vec()
}

const CMD_SET_TAB_WINDOW: u8 = 0;
const CMD_SET_TAB_INDEX_IN_WINDOW: u8 = 2;
const CMD_UPDATE_TAB_NAVIGATION: u8 = 6;
const CMD_SET_SELECTED_NAVIGATION_INDEX: u8 = 7;
const CMD_TAB_CLOSED: u8 = 16;
const CMD_WINDOW_CLOSED: u8 = 17;

/// Writes `SNSS` session command files the way the browser lays them out
#[derive(Debug, Clone)]
pub struct SessionFileWriter {
    buf: Vec<u8>,
}

impl SessionFileWriter {
    pub fn new() -> Self {
        Self::with_version(1)
    }

    pub fn with_version(version: i32) -> Self {
        let mut buf = b"SNSS".to_vec();
        buf.extend_from_slice(&version.to_le_bytes());
        Self { buf }
    }

    fn command(mut self, id: u8, payload: &[u8]) -> Self {
        let size = u16::try_from(payload.len() + 1).expect("command fits in u16");
        self.buf.extend_from_slice(&size.to_le_bytes());
        self.buf.push(id);
        self.buf.extend_from_slice(payload);
        self
    }

    fn pair(self, id: u8, a: i32, b: i32) -> Self {
        let mut payload = a.to_le_bytes().to_vec();
        payload.extend_from_slice(&b.to_le_bytes());
        self.command(id, &payload)
    }

    pub fn set_tab_window(self, window_id: i32, tab_id: i32) -> Self {
        self.pair(CMD_SET_TAB_WINDOW, window_id, tab_id)
    }

    pub fn set_tab_index(self, tab_id: i32, index: i32) -> Self {
        self.pair(CMD_SET_TAB_INDEX_IN_WINDOW, tab_id, index)
    }

    pub fn select_navigation(self, tab_id: i32, index: i32) -> Self {
        self.pair(CMD_SET_SELECTED_NAVIGATION_INDEX, tab_id, index)
    }

    /// Navigation payload is a pickle: size, tab id, index, UTF-8 url, UTF-16 title
    pub fn update_navigation(self, tab_id: i32, index: i32, url: &str, title: &str) -> Self {
        let mut body = Vec::new();
        body.extend_from_slice(&tab_id.to_le_bytes());
        body.extend_from_slice(&index.to_le_bytes());
        body.extend_from_slice(&(url.len() as i32).to_le_bytes());
        body.extend_from_slice(url.as_bytes());
        pad4(&mut body);
        let units: Vec<u16> = title.encode_utf16().collect();
        body.extend_from_slice(&(units.len() as i32).to_le_bytes());
        for unit in units {
            body.extend_from_slice(&unit.to_le_bytes());
        }
        pad4(&mut body);

        let mut payload = (body.len() as u32).to_le_bytes().to_vec();
        payload.extend_from_slice(&body);
        self.command(CMD_UPDATE_TAB_NAVIGATION, &payload)
    }

    pub fn tab_closed(self, tab_id: i32) -> Self {
        let mut payload = tab_id.to_le_bytes().to_vec();
        payload.extend_from_slice(&0i64.to_le_bytes());
        self.command(CMD_TAB_CLOSED, &payload)
    }

    pub fn window_closed(self, window_id: i32) -> Self {
        let mut payload = window_id.to_le_bytes().to_vec();
        payload.extend_from_slice(&0i64.to_le_bytes());
        self.command(CMD_WINDOW_CLOSED, &payload)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

fn pad4(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

pub const SAMPLE_BOOKMARKS: &str = r#"{
  "checksum": "0",
  "roots": {
    "bookmark_bar": {
      "id": "1", "name": "Bookmarks bar", "type": "folder", "date_added": "13340000000000000",
      "children": [
        { "id": "4", "name": "Rust Docs", "type": "url", "url": "https://doc.rust-lang.org/", "date_added": "13350000000000000" },
        { "id": "5", "name": "Work", "type": "folder", "children": [
          { "id": "6", "name": "Tracker", "type": "url", "url": "https://tracker.example/board" }
        ] }
      ]
    },
    "other": { "id": "2", "name": "Other bookmarks", "type": "folder", "children": [
      { "id": "7", "name": "Crates", "type": "url", "url": "https://crates.io/" }
    ] },
    "synced": { "id": "3", "name": "Mobile bookmarks", "type": "folder", "children": [] }
  },
  "version": 1
}"#;
