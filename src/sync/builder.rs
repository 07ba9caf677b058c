//! Reconstruction of per-device tab lists from raw sync records.
//!
//! Records are collected in one pass ([`SessionBuilder::ingest`]) and resolved
//! afterwards ([`SessionBuilder::finish`]), because a data record's metadata sorts
//! after it in the store.
//!
//! # Resolution
//!
//! - Metadata joins data by `(model, storage key)` and supplies the version marker,
//!   the tombstone flag and the modification time.
//! - Last-write-wins per entity: tabs by `(session tag, tab id)` (tab node id when the
//!   tab id is unset), headers by session tag, devices by cache guid. On equal
//!   version markers the record seen later in the scan wins.
//! - A tombstoned winner removes its entity. A deleted header removes the whole device
//!   session; a deleted device descriptor only stops being used for names.
//! - When a live header lists window tab ids, tabs not listed anywhere are closed
//!   tabs and are dropped.
//! - A live, named header yields a device session even when none of its tabs
//!   survive; such a device is listed with no tabs.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::models::{DeviceSession, DeviceType, SyncedTab};
use crate::parsers::sync_records::{
    Decoded, DeviceInfoRecord, EntityMetadata, ModelType, RecordKind, SessionHeaderRecord, SessionTabRecord, SkipReason,
    SyncRecord, VersionMarker, decode_record, parse_key,
};

pub const UNKNOWN_DEVICE_ID: &str = "unknown";
pub const UNKNOWN_DEVICE_NAME: &str = "Unknown device";

/// Session tags are the device's cache guid behind this prefix
const SESSION_TAG_PREFIX: &str = "session_sync";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum TabEntity {
    Tab(i32),
    Node(i32),
}

#[derive(Debug)]
struct Candidate<T> {
    version: VersionMarker,
    deleted: bool,
    modification_time: Option<i64>,
    record: T,
}

struct DataRecord {
    model: ModelType,
    storage_key: String,
    record: SyncRecord,
}

/// Accumulates decoded records and resolves them into device sessions.
#[derive(Default)]
pub struct SessionBuilder {
    data: Vec<DataRecord>,
    metadata: HashMap<(ModelType, String), EntityMetadata>,
    records_seen: usize,
    skipped: BTreeMap<&'static str, usize>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify and decode one raw store record
    pub fn ingest(&mut self, key: &[u8], value: &[u8]) {
        self.records_seen += 1;

        let parsed = match parse_key(key) {
            Ok(parsed) => parsed,
            Err(reason) => {
                self.skip(key, reason);
                return;
            }
        };

        match decode_record(&parsed, value) {
            Decoded::Record(SyncRecord::Metadata(meta)) => {
                self.metadata.insert((parsed.model, parsed.storage_key), meta);
            }
            Decoded::Record(record) => {
                debug_assert_eq!(parsed.kind, RecordKind::Data);
                self.data.push(DataRecord { model: parsed.model, storage_key: parsed.storage_key, record });
            }
            Decoded::Skip(reason) => self.skip(key, reason),
        }
    }

    fn skip(&mut self, key: &[u8], reason: SkipReason) {
        // Records of other models are expected in bulk; not worth a line each.
        if !matches!(reason, SkipReason::UnsupportedModel(_) | SkipReason::GlobalMetadata) {
            debug!("skipping sync record {}: {}", String::from_utf8_lossy(key), reason);
        }
        *self.skipped.entry(reason.category()).or_default() += 1;
    }

    /// Skipped record counts per category
    pub fn skipped(&self) -> &BTreeMap<&'static str, usize> {
        &self.skipped
    }

    pub fn finish(self) -> Vec<DeviceSession> {
        let Self { data, metadata, records_seen, skipped } = self;

        let mut tabs: BTreeMap<(String, TabEntity), Candidate<SessionTabRecord>> = BTreeMap::new();
        let mut headers: BTreeMap<String, Candidate<SessionHeaderRecord>> = BTreeMap::new();
        let mut devices: BTreeMap<String, Candidate<DeviceInfoRecord>> = BTreeMap::new();
        let mut unidentified_tabs = 0usize;

        // Scan order is preserved in `data`, so `>=` lets a later record win a tie.
        for DataRecord { model, storage_key, record } in data {
            let meta = metadata.get(&(model, storage_key));
            let version = meta.map(EntityMetadata::version).unwrap_or_default();
            let deleted = meta.is_some_and(|m| m.is_deleted);
            let modification_time = meta.and_then(|m| m.modification_time);

            match record {
                SyncRecord::Tab(tab) => {
                    let entity = match (tab.tab_id, tab.tab_node_id) {
                        (Some(id), _) => TabEntity::Tab(id),
                        (None, Some(node)) => TabEntity::Node(node),
                        (None, None) => {
                            unidentified_tabs += 1;
                            continue;
                        }
                    };
                    let candidate = Candidate { version, deleted, modification_time, record: tab };
                    keep_latest(&mut tabs, (candidate.record.session_tag.clone(), entity), candidate);
                }
                SyncRecord::Header(header) => {
                    let candidate = Candidate { version, deleted, modification_time, record: header };
                    keep_latest(&mut headers, candidate.record.session_tag.clone(), candidate);
                }
                SyncRecord::Device(device) => {
                    let candidate = Candidate { version, deleted, modification_time, record: device };
                    keep_latest(&mut devices, candidate.record.cache_guid.clone(), candidate);
                }
                SyncRecord::Metadata(_) => {}
            }
        }

        let deleted_sessions: HashSet<&str> =
            headers.iter().filter(|(_, c)| c.deleted).map(|(tag, _)| tag.as_str()).collect();
        let live_headers: HashMap<&str, &SessionHeaderRecord> =
            headers.iter().filter(|(_, c)| !c.deleted).map(|(tag, c)| (tag.as_str(), &c.record)).collect();
        let live_devices: HashMap<&str, &DeviceInfoRecord> =
            devices.iter().filter(|(_, c)| !c.deleted).map(|(guid, c)| (guid.as_str(), &c.record)).collect();

        let mut sessions: BTreeMap<String, DeviceSession> = BTreeMap::new();
        let mut header_times: HashMap<String, i64> = HashMap::new();
        let mut dropped = 0usize;

        for (&session_tag, &header) in &live_headers {
            let device = live_devices.get(cache_guid(session_tag)).copied();
            let Some(device_name) = resolve_name(Some(header), device) else {
                continue;
            };
            if let Some(time) = headers.get(session_tag).and_then(|c| c.modification_time) {
                header_times.insert(session_tag.to_string(), time);
            }
            sessions.insert(
                session_tag.to_string(),
                DeviceSession {
                    device_id: session_tag.to_string(),
                    device_name,
                    device_type: resolve_type(Some(header), device),
                    tabs: Vec::new(),
                },
            );
        }

        for ((session_tag, _), candidate) in &tabs {
            if candidate.deleted || deleted_sessions.contains(session_tag.as_str()) {
                dropped += 1;
                continue;
            }

            let header = live_headers.get(session_tag.as_str()).copied();
            if let Some(header) = header
                && is_closed(header, &candidate.record)
            {
                dropped += 1;
                continue;
            }

            let tab = &candidate.record;
            let Some(nav) = tab.current_navigation().filter(|n| !n.virtual_url.is_empty()) else {
                dropped += 1;
                continue;
            };

            let last_modified = nav
                .timestamp_msec
                .and_then(DateTime::from_timestamp_millis)
                .or_else(|| candidate.modification_time.and_then(DateTime::from_timestamp_millis))
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

            let device = live_devices.get(cache_guid(session_tag)).copied();
            let (device_id, device_name, device_type) = match resolve_name(header, device) {
                Some(name) => (session_tag.clone(), name, resolve_type(header, device)),
                None => (UNKNOWN_DEVICE_ID.to_string(), UNKNOWN_DEVICE_NAME.to_string(), DeviceType::Unknown),
            };

            let session = sessions.entry(device_id.clone()).or_insert_with(|| DeviceSession {
                device_id,
                device_name: device_name.clone(),
                device_type,
                tabs: Vec::new(),
            });
            session.tabs.push(SyncedTab {
                device_name: session.device_name.clone(),
                url: nav.virtual_url.clone(),
                title: nav.title.clone(),
                last_modified,
            });
        }

        let mut sessions: Vec<DeviceSession> = sessions.into_values().collect();
        for session in &mut sessions {
            session.tabs.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        }
        // Devices without tabs come last, most recently synced header first.
        sessions.sort_by(|a, b| {
            b.last_active()
                .cmp(&a.last_active())
                .then_with(|| header_times.get(&b.device_id).cmp(&header_times.get(&a.device_id)))
        });

        let skipped_total: usize = skipped.values().sum();
        info!(
            "sync store: {} records, {} devices with {} tabs ({} skipped, {} superseded or closed)",
            records_seen,
            sessions.len(),
            sessions.iter().map(|s| s.tabs.len()).sum::<usize>(),
            skipped_total,
            dropped
        );
        if unidentified_tabs > 0 {
            debug!("{unidentified_tabs} tab records had neither tab id nor node id");
        }

        sessions
    }
}

fn keep_latest<K: Ord, T>(map: &mut BTreeMap<K, Candidate<T>>, key: K, candidate: Candidate<T>) {
    match map.get(&key) {
        Some(existing) if candidate.version < existing.version => {}
        _ => {
            map.insert(key, candidate);
        }
    }
}

fn is_closed(header: &SessionHeaderRecord, tab: &SessionTabRecord) -> bool {
    let mut open = header.open_tab_ids().peekable();
    if open.peek().is_none() {
        return false;
    }
    match tab.tab_id {
        Some(id) => !open.any(|open_id| open_id == id),
        None => true,
    }
}

fn cache_guid(session_tag: &str) -> &str {
    session_tag.strip_prefix(SESSION_TAG_PREFIX).unwrap_or(session_tag)
}

fn resolve_name(header: Option<&SessionHeaderRecord>, device: Option<&DeviceInfoRecord>) -> Option<String> {
    header
        .and_then(|h| h.client_name.as_deref())
        .or_else(|| device.and_then(|d| d.client_name.as_deref()))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn resolve_type(header: Option<&SessionHeaderRecord>, device: Option<&DeviceInfoRecord>) -> DeviceType {
    header
        .map(|h| h.device_type)
        .filter(|t| *t != DeviceType::Unknown)
        .or_else(|| device.map(|d| d.device_type))
        .unwrap_or_default()
}
