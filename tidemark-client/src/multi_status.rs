/// Per-device outcomes of a bulk write
///
/// A bulk write is applied device by device, so one request can partially
/// succeed. The backend reports that with a 207 whose body maps each device
/// key to its outcome. A partial failure is a value to inspect, not an
/// error: only statuses outside the 2xx/207 contract become errors.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{ClientError, Result};

/// What the write did to the device record itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceState {
    /// Device already existed, record untouched
    Existing,
    /// Device existed, record updated
    Modified,
    /// Device was created by this write
    Created,
}

/// Outcome for one device within a bulk write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteStatus {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_state: Option<DeviceState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Aggregated write outcome, one entry per device the server reported on
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiStatus {
    statuses: HashMap<String, WriteStatus>,
}

impl MultiStatus {
    /// Classify a write response.
    ///
    /// 207 carries per-device outcomes in the body; any other 2xx is a
    /// total success with zero entries. Everything else is a hard error.
    pub fn from_response(status: u16, body: &str) -> Result<Self> {
        match status {
            207 => {
                let statuses: HashMap<String, WriteStatus> = serde_json::from_str(body)
                    .map_err(|e| {
                        ClientError::Malformed(format!("multi-status body: {}", e))
                    })?;
                Ok(Self { statuses })
            }
            s if (200..300).contains(&s) => Ok(Self::default()),
            s => Err(ClientError::UnexpectedStatus {
                status: s,
                body: body.to_string(),
            }),
        }
    }

    /// True when every reported device succeeded (vacuously true for a
    /// plain 2xx with no entries).
    pub fn is_success(&self) -> bool {
        self.statuses.values().all(|s| s.success)
    }

    /// True when at least one device failed.
    pub fn is_partial_success(&self) -> bool {
        !self.is_success()
    }

    /// Failed devices with the server's message, empty string when the
    /// server gave none.
    pub fn failures(&self) -> HashMap<String, String> {
        self.statuses
            .iter()
            .filter(|(_, status)| !status.success)
            .map(|(key, status)| (key.clone(), status.message.clone().unwrap_or_default()))
            .collect()
    }

    pub fn get(&self, device_key: &str) -> Option<&WriteStatus> {
        self.statuses.get(device_key)
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Devices the write left untouched
    pub fn existing(&self) -> Vec<String> {
        self.with_state(DeviceState::Existing)
    }

    /// Devices the write updated
    pub fn modified(&self) -> Vec<String> {
        self.with_state(DeviceState::Modified)
    }

    /// Devices the write created
    pub fn created(&self) -> Vec<String> {
        self.with_state(DeviceState::Created)
    }

    fn with_state(&self, state: DeviceState) -> Vec<String> {
        let mut keys: Vec<String> = self
            .statuses
            .iter()
            .filter(|(_, status)| status.device_state == Some(state))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }
}
