/// Bulk write payloads
use crate::DataPoint;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A batch of readings destined for many devices and sensors at once.
///
/// The wire shape is a nested map, device key -> sensor key -> points:
///
/// ```json
/// {"pump-4": {"flow": [{"t": "2025-03-14T09:26:53.000Z", "v": 2.5}]}}
/// ```
///
/// Bulk writes are applied per device on the backend, so a single request
/// can partially succeed; see the client's multi-status handling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BulkWrite {
    data: HashMap<String, HashMap<String, Vec<DataPoint>>>,
}

impl BulkWrite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one reading for a device's sensor.
    pub fn push(
        &mut self,
        device_key: impl Into<String>,
        sensor_key: impl Into<String>,
        point: DataPoint,
    ) -> &mut Self {
        self.data
            .entry(device_key.into())
            .or_default()
            .entry(sensor_key.into())
            .or_default()
            .push(point);
        self
    }

    /// True when no readings have been queued.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of devices with queued readings.
    pub fn device_count(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_wire_shape() {
        let t = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        let mut write = BulkWrite::new();
        write.push("pump-4", "flow", DataPoint::new(t, 2.5));

        let encoded = serde_json::to_value(&write).unwrap();
        assert_eq!(
            encoded,
            serde_json::json!({
                "pump-4": {"flow": [{"t": "2025-03-14T09:26:53.000Z", "v": 2.5}]}
            })
        );
    }

    #[test]
    fn test_push_accumulates() {
        let t = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        let mut write = BulkWrite::new();
        write
            .push("pump-4", "flow", DataPoint::new(t, 2.5))
            .push("pump-4", "flow", DataPoint::new(t, 2.6))
            .push("pump-4", "pressure", DataPoint::new(t, 40.0))
            .push("pump-9", "flow", DataPoint::new(t, 1.1));

        assert_eq!(write.device_count(), 2);
        assert!(!write.is_empty());
    }
}
