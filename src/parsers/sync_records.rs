//! Typed decoding of sync store records.
//!
//! The sync engine keeps one LevelDB per profile. Each entity is stored twice:
//! its data (`<model>-dt-<storage key>`) and its bookkeeping metadata
//! (`<model>-md-<storage key>`). Only the `sessions` and `device_info` models are
//! decoded; everything else in the store is reported as a [`SkipReason`].
//!
//! Decoding never fails outright: every record becomes either
//! [`Decoded::Record`] or [`Decoded::Skip`], so one corrupt value cannot take down a
//! whole scan.

use prost::Message;
use thiserror::Error;

use super::sync_proto as proto;
use crate::models::DeviceType;

/// Outcome of decoding one stored record
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Record(T),
    Skip(SkipReason),
}

impl<T> Decoded<T> {
    fn from_result(result: Result<T, SkipReason>) -> Self {
        match result {
            Ok(record) => Decoded::Record(record),
            Err(reason) => Decoded::Skip(reason),
        }
    }
}

/// Why a stored record did not contribute to the result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("store-wide metadata record")]
    GlobalMetadata,

    #[error("model '{0}' is not read")]
    UnsupportedModel(String),

    #[error("unrecognized key '{0}'")]
    MalformedKey(String),

    #[error("corrupt value: {0}")]
    Corrupt(String),

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("session record has neither header nor tab")]
    EmptySpecifics,
}

impl From<prost::DecodeError> for SkipReason {
    fn from(err: prost::DecodeError) -> Self {
        SkipReason::Corrupt(err.to_string())
    }
}

impl SkipReason {
    /// Short category for scan summaries
    pub fn category(&self) -> &'static str {
        match self {
            SkipReason::GlobalMetadata => "global-metadata",
            SkipReason::UnsupportedModel(_) => "other-model",
            SkipReason::MalformedKey(_) => "malformed-key",
            SkipReason::Corrupt(_) => "corrupt",
            SkipReason::MissingField(_) => "missing-field",
            SkipReason::EmptySpecifics => "empty",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelType {
    Sessions,
    DeviceInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Data,
    Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordKey {
    pub model: ModelType,
    pub kind: RecordKind,
    pub storage_key: String,
}

/// Classify a raw store key
pub fn parse_key(raw: &[u8]) -> Result<RecordKey, SkipReason> {
    let key = String::from_utf8_lossy(raw);
    // Model names use underscores, so the first '-' ends the model.
    let (model, rest) = key.split_once('-').ok_or_else(|| SkipReason::MalformedKey(key.to_string()))?;

    if rest == "GlobalMetadata" {
        return Err(SkipReason::GlobalMetadata);
    }

    let model = match model {
        "sessions" => ModelType::Sessions,
        "device_info" => ModelType::DeviceInfo,
        other => return Err(SkipReason::UnsupportedModel(other.to_string())),
    };

    let (kind, storage_key) = rest.split_once('-').ok_or_else(|| SkipReason::MalformedKey(key.to_string()))?;
    let kind = match kind {
        "dt" => RecordKind::Data,
        "md" => RecordKind::Metadata,
        _ => return Err(SkipReason::MalformedKey(key.to_string())),
    };
    if storage_key.is_empty() {
        return Err(SkipReason::MalformedKey(key.to_string()));
    }

    Ok(RecordKey { model, kind, storage_key: storage_key.to_string() })
}

/// Ordering used for last-write-wins: `sequence_number` first, then `server_version`.
pub type VersionMarker = (i64, i64);

/// Per-entity bookkeeping kept next to every data record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityMetadata {
    pub is_deleted: bool,
    pub sequence_number: i64,
    pub server_version: i64,
    /// Milliseconds since the Unix epoch
    pub modification_time: Option<i64>,
}

impl EntityMetadata {
    pub fn version(&self) -> VersionMarker {
        (self.sequence_number, self.server_version)
    }
}

impl From<proto::EntityMetadata> for EntityMetadata {
    fn from(meta: proto::EntityMetadata) -> Self {
        Self {
            is_deleted: meta.is_deleted.unwrap_or(false),
            sequence_number: meta.sequence_number.unwrap_or(0),
            server_version: meta.server_version.unwrap_or(0),
            modification_time: meta.modification_time,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigation {
    pub virtual_url: String,
    pub title: String,
    pub timestamp_msec: Option<i64>,
}

impl From<proto::TabNavigation> for Navigation {
    fn from(nav: proto::TabNavigation) -> Self {
        Self {
            virtual_url: nav.virtual_url.unwrap_or_default(),
            title: nav.title.unwrap_or_default(),
            timestamp_msec: nav.timestamp_msec,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionTabRecord {
    pub session_tag: String,
    pub tab_node_id: Option<i32>,
    pub tab_id: Option<i32>,
    pub current_navigation_index: Option<i32>,
    pub navigations: Vec<Navigation>,
}

impl SessionTabRecord {
    /// The navigation the tab is showing; an out-of-range index falls back to the last one
    pub fn current_navigation(&self) -> Option<&Navigation> {
        self.current_navigation_index
            .and_then(|idx| usize::try_from(idx).ok())
            .and_then(|idx| self.navigations.get(idx))
            .or_else(|| self.navigations.last())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionHeaderRecord {
    pub session_tag: String,
    pub client_name: Option<String>,
    pub device_type: DeviceType,
    /// Tab ids per window, in window order
    pub windows: Vec<Vec<i32>>,
}

impl SessionHeaderRecord {
    pub fn open_tab_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.windows.iter().flat_map(|tabs| tabs.iter().copied())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfoRecord {
    pub cache_guid: String,
    pub client_name: Option<String>,
    pub device_type: DeviceType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncRecord {
    Header(SessionHeaderRecord),
    Tab(SessionTabRecord),
    Device(DeviceInfoRecord),
    Metadata(EntityMetadata),
}

/// Decode one value according to its key
pub fn decode_record(key: &RecordKey, value: &[u8]) -> Decoded<SyncRecord> {
    let result = match (key.kind, key.model) {
        (RecordKind::Metadata, _) => decode_metadata(value).map(SyncRecord::Metadata),
        (RecordKind::Data, ModelType::Sessions) => decode_session_specifics(value),
        (RecordKind::Data, ModelType::DeviceInfo) => decode_device_info(value).map(SyncRecord::Device),
    };
    Decoded::from_result(result)
}

pub fn decode_metadata(buf: &[u8]) -> Result<EntityMetadata, SkipReason> {
    Ok(proto::EntityMetadata::decode(buf)?.into())
}

fn decode_session_specifics(buf: &[u8]) -> Result<SyncRecord, SkipReason> {
    let specifics = proto::SessionSpecifics::decode(buf)?;
    let session_tag =
        specifics.session_tag.filter(|t| !t.is_empty()).ok_or(SkipReason::MissingField("session_tag"))?;

    if let Some(header) = specifics.header {
        return Ok(SyncRecord::Header(SessionHeaderRecord {
            session_tag,
            client_name: header.client_name,
            device_type: header.device_type.map(DeviceType::from_wire).unwrap_or_default(),
            windows: header.window.into_iter().map(|w| w.tab).collect(),
        }));
    }
    if let Some(tab) = specifics.tab {
        return Ok(SyncRecord::Tab(SessionTabRecord {
            session_tag,
            tab_node_id: specifics.tab_node_id,
            tab_id: tab.tab_id,
            current_navigation_index: tab.current_navigation_index,
            navigations: tab.navigation.into_iter().map(Navigation::from).collect(),
        }));
    }
    Err(SkipReason::EmptySpecifics)
}

fn decode_device_info(buf: &[u8]) -> Result<DeviceInfoRecord, SkipReason> {
    let device = proto::DeviceInfoSpecifics::decode(buf)?;
    let cache_guid = device.cache_guid.filter(|g| !g.is_empty()).ok_or(SkipReason::MissingField("cache_guid"))?;
    Ok(DeviceInfoRecord {
        cache_guid,
        client_name: device.client_name,
        device_type: device.device_type.map(DeviceType::from_wire).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::sync_proto::{SessionHeader, SessionSpecifics, SessionTab, SessionWindow, TabNavigation};

    fn nav(url: &str, title: &str, ts: i64) -> TabNavigation {
        TabNavigation { virtual_url: Some(url.into()), title: Some(title.into()), timestamp_msec: Some(ts) }
    }

    fn specifics(tag: Option<&str>) -> SessionSpecifics {
        SessionSpecifics { session_tag: tag.map(str::to_string), ..SessionSpecifics::default() }
    }

    #[test]
    fn test_parse_key_variants() {
        let key = parse_key(b"sessions-dt-session_sync123-7").unwrap();
        assert_eq!(key.model, ModelType::Sessions);
        assert_eq!(key.kind, RecordKind::Data);
        assert_eq!(key.storage_key, "session_sync123-7");

        let key = parse_key(b"device_info-md-abc").unwrap();
        assert_eq!(key.model, ModelType::DeviceInfo);
        assert_eq!(key.kind, RecordKind::Metadata);

        assert_eq!(parse_key(b"sessions-GlobalMetadata"), Err(SkipReason::GlobalMetadata));
        assert_eq!(parse_key(b"bookmarks-dt-1"), Err(SkipReason::UnsupportedModel("bookmarks".to_string())));
        assert!(matches!(parse_key(b"sessions-xx-1"), Err(SkipReason::MalformedKey(_))));
        assert!(matches!(parse_key(b"sessions"), Err(SkipReason::MalformedKey(_))));
        assert!(matches!(parse_key(b"sessions-dt-"), Err(SkipReason::MalformedKey(_))));
    }

    #[test]
    fn test_decode_metadata() {
        let buf = proto::EntityMetadata {
            is_deleted: Some(true),
            sequence_number: Some(2),
            server_version: Some(17),
            modification_time: Some(1_700_000_000_000),
        }
        .encode_to_vec();
        let meta = decode_metadata(&buf).unwrap();
        assert!(meta.is_deleted);
        assert_eq!(meta.version(), (2, 17));
        assert_eq!(meta.modification_time, Some(1_700_000_000_000));
    }

    #[test]
    fn test_empty_metadata_is_version_zero() {
        let meta = decode_metadata(&[]).unwrap();
        assert_eq!(meta.version(), (0, 0));
        assert!(!meta.is_deleted);
    }

    #[test]
    fn test_decode_tab() {
        let tab = SessionTab {
            tab_id: Some(42),
            current_navigation_index: Some(1),
            navigation: vec![nav("https://a.example", "A", 1000), nav("https://b.example", "B", 2000)],
        };
        let buf = SessionSpecifics { tab: Some(tab), tab_node_id: Some(5), ..specifics(Some("session_sync1")) }
            .encode_to_vec();
        let key = parse_key(b"sessions-dt-session_sync1-5").unwrap();

        match decode_record(&key, &buf) {
            Decoded::Record(SyncRecord::Tab(tab)) => {
                assert_eq!(tab.session_tag, "session_sync1");
                assert_eq!(tab.tab_id, Some(42));
                assert_eq!(tab.tab_node_id, Some(5));
                let current = tab.current_navigation().unwrap();
                assert_eq!(current.virtual_url, "https://b.example");
                assert_eq!(current.timestamp_msec, Some(2000));
            }
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn test_current_navigation_out_of_range_uses_last() {
        let tab = SessionTabRecord {
            current_navigation_index: Some(9),
            navigations: vec![
                Navigation { virtual_url: "a".into(), ..Navigation::default() },
                Navigation { virtual_url: "b".into(), ..Navigation::default() },
            ],
            ..SessionTabRecord::default()
        };
        assert_eq!(tab.current_navigation().unwrap().virtual_url, "b");

        let negative = SessionTabRecord { current_navigation_index: Some(-1), ..tab };
        assert_eq!(negative.current_navigation().unwrap().virtual_url, "b");
    }

    #[test]
    fn test_decode_header_with_windows() {
        let header = SessionHeader {
            window: vec![
                SessionWindow { tab: vec![10, 11] },
                SessionWindow { tab: vec![12, 13] },
            ],
            client_name: Some("Work Laptop".into()),
            device_type: Some(3),
        };
        let buf = SessionSpecifics { header: Some(header), ..specifics(Some("session_sync9")) }.encode_to_vec();
        let key = parse_key(b"sessions-dt-session_sync9").unwrap();

        match decode_record(&key, &buf) {
            Decoded::Record(SyncRecord::Header(header)) => {
                assert_eq!(header.client_name.as_deref(), Some("Work Laptop"));
                assert_eq!(header.device_type, DeviceType::Linux);
                assert_eq!(header.open_tab_ids().collect::<Vec<_>>(), vec![10, 11, 12, 13]);
            }
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn test_decode_device_info() {
        let buf = proto::DeviceInfoSpecifics {
            cache_guid: Some("guid-1".into()),
            client_name: Some("Pixel".into()),
            device_type: Some(6),
        }
        .encode_to_vec();
        let key = parse_key(b"device_info-dt-guid-1").unwrap();
        match decode_record(&key, &buf) {
            Decoded::Record(SyncRecord::Device(device)) => {
                assert_eq!(device.cache_guid, "guid-1");
                assert_eq!(device.client_name.as_deref(), Some("Pixel"));
                assert_eq!(device.device_type, DeviceType::Phone);
            }
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn test_device_info_without_guid_skipped() {
        let buf = proto::DeviceInfoSpecifics { client_name: Some("Pixel".into()), ..Default::default() }.encode_to_vec();
        let key = parse_key(b"device_info-dt-x").unwrap();
        assert_eq!(decode_record(&key, &buf), Decoded::Skip(SkipReason::MissingField("cache_guid")));
    }

    #[test]
    fn test_missing_session_tag_skipped() {
        let buf = SessionSpecifics { tab: Some(SessionTab::default()), ..specifics(None) }.encode_to_vec();
        let key = parse_key(b"sessions-dt-x").unwrap();
        assert_eq!(decode_record(&key, &buf), Decoded::Skip(SkipReason::MissingField("session_tag")));
    }

    #[test]
    fn test_empty_specifics_skipped() {
        let buf = specifics(Some("session_sync1")).encode_to_vec();
        let key = parse_key(b"sessions-dt-x").unwrap();
        assert_eq!(decode_record(&key, &buf), Decoded::Skip(SkipReason::EmptySpecifics));
    }

    #[test]
    fn test_corrupt_value_skipped() {
        let key = parse_key(b"sessions-dt-x").unwrap();
        let decoded = decode_record(&key, &[0x0A, 0x10, b'a']);
        match decoded {
            Decoded::Skip(reason) => assert_eq!(reason.category(), "corrupt"),
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn test_corrupt_nested_navigation_skips_whole_record() {
        // tab { tab_id: 1, navigation: <9 bytes declared, 1 present> }
        let tab = [0x08, 0x01, 0x3A, 0x03, 0x12, 0x09, b'x'];
        let mut buf = specifics(Some("session_sync1")).encode_to_vec();
        buf.push(0x1A);
        buf.push(tab.len() as u8);
        buf.extend_from_slice(&tab);
        let key = parse_key(b"sessions-dt-x").unwrap();
        assert!(matches!(decode_record(&key, &buf), Decoded::Skip(SkipReason::Corrupt(_))));
    }
}
