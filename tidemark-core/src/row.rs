/// Multi-stream read rows
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One timestamp's readings across every selected sensor stream.
///
/// Read queries return rows rather than per-sensor point lists: all streams
/// that produced a value at a given instant are folded into one record,
/// keyed by device then sensor. On the wire:
///
/// ```json
/// {"t": "2025-03-14T09:26:53.000Z", "data": {"pump-4": {"flow": 2.5}}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Row timestamp.
    #[serde(rename = "t", with = "crate::time::serde_rfc3339")]
    pub ts: DateTime<Utc>,
    /// Values present at this timestamp, device key -> sensor key -> value.
    #[serde(rename = "data")]
    pub values: HashMap<String, HashMap<String, f64>>,
}

impl Row {
    /// Look up the value for one device/sensor pair, if this row has one.
    pub fn value(&self, device_key: &str, sensor_key: &str) -> Option<f64> {
        self.values.get(device_key)?.get(sensor_key).copied()
    }
}
