//! Protobuf schema of the sync records that are read.
//!
//! Only the fields the reconstruction uses are declared; every other field in a
//! stored message is skipped by the decoder. The sync engine writes proto2, so
//! scalars are `optional` and repeated scalars are unpacked on the wire (the
//! decoder accepts the packed form as well).

/// Bookkeeping stored next to every entity (`<model>-md-<key>`)
#[derive(Clone, PartialEq, prost::Message)]
pub struct EntityMetadata {
    #[prost(bool, optional, tag = "3")]
    pub is_deleted: Option<bool>,
    #[prost(int64, optional, tag = "4")]
    pub sequence_number: Option<i64>,
    #[prost(int64, optional, tag = "6")]
    pub server_version: Option<i64>,
    /// Milliseconds since the Unix epoch
    #[prost(int64, optional, tag = "8")]
    pub modification_time: Option<i64>,
}

/// Value of a `sessions-dt-*` record: either a header or a tab of one device
#[derive(Clone, PartialEq, prost::Message)]
pub struct SessionSpecifics {
    #[prost(string, optional, tag = "1")]
    pub session_tag: Option<String>,
    #[prost(message, optional, tag = "2")]
    pub header: Option<SessionHeader>,
    #[prost(message, optional, tag = "3")]
    pub tab: Option<SessionTab>,
    #[prost(int32, optional, tag = "4")]
    pub tab_node_id: Option<i32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SessionHeader {
    #[prost(message, repeated, tag = "2")]
    pub window: Vec<SessionWindow>,
    #[prost(string, optional, tag = "3")]
    pub client_name: Option<String>,
    #[prost(int32, optional, tag = "4")]
    pub device_type: Option<i32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SessionWindow {
    #[prost(int32, repeated, packed = "false", tag = "4")]
    pub tab: Vec<i32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SessionTab {
    #[prost(int32, optional, tag = "1")]
    pub tab_id: Option<i32>,
    #[prost(int32, optional, tag = "4")]
    pub current_navigation_index: Option<i32>,
    #[prost(message, repeated, tag = "7")]
    pub navigation: Vec<TabNavigation>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct TabNavigation {
    #[prost(string, optional, tag = "2")]
    pub virtual_url: Option<String>,
    #[prost(string, optional, tag = "4")]
    pub title: Option<String>,
    #[prost(int64, optional, tag = "9")]
    pub timestamp_msec: Option<i64>,
}

/// Value of a `device_info-dt-*` record
#[derive(Clone, PartialEq, prost::Message)]
pub struct DeviceInfoSpecifics {
    #[prost(string, optional, tag = "1")]
    pub cache_guid: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub client_name: Option<String>,
    #[prost(int32, optional, tag = "3")]
    pub device_type: Option<i32>,
}
