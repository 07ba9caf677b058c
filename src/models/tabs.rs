use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Form factor reported by a syncing device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Windows,
    Mac,
    Linux,
    #[serde(rename = "chromeos")]
    ChromeOs,
    Phone,
    Tablet,
    Other,
    #[default]
    Unknown,
}

impl DeviceType {
    /// Map the `SyncEnums.DeviceType` wire value
    pub fn from_wire(value: i32) -> DeviceType {
        match value {
            1 => DeviceType::Windows,
            2 => DeviceType::Mac,
            3 => DeviceType::Linux,
            4 => DeviceType::ChromeOs,
            5 => DeviceType::Other,
            6 => DeviceType::Phone,
            7 => DeviceType::Tablet,
            _ => DeviceType::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncedTab {
    pub device_name: String,
    pub url: String,
    pub title: String,
    pub last_modified: DateTime<Utc>,
}

/// All open tabs of one syncing device, most recently modified first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSession {
    pub device_id: String,
    pub device_name: String,
    pub device_type: DeviceType,
    pub tabs: Vec<SyncedTab>,
}

impl DeviceSession {
    pub fn last_active(&self) -> Option<DateTime<Utc>> {
        self.tabs.iter().map(|t| t.last_modified).max()
    }
}

/// A tab of the local browser, taken from its session command file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalTab {
    pub window_id: i32,
    pub tab_id: i32,
    pub url: String,
    pub title: String,
}
