/// Data points
use crate::time;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single timestamped reading from one sensor.
///
/// On the wire a point is `{"t": "<rfc3339-millis>", "v": <number>}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Reading timestamp, always UTC on the wire.
    #[serde(with = "crate::time::serde_rfc3339")]
    pub t: DateTime<Utc>,
    /// Reading value.
    pub v: f64,
}

impl DataPoint {
    pub fn new(t: DateTime<Utc>, v: f64) -> Self {
        Self { t, v }
    }
}

impl std::fmt::Display for DataPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", time::format(&self.t), self.v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_wire_shape() {
        let point = DataPoint::new(Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap(), 2.5);
        let encoded = serde_json::to_string(&point).unwrap();
        assert_eq!(encoded, r#"{"t":"2025-03-14T09:26:53.000Z","v":2.5}"#);

        let decoded: DataPoint = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, point);
    }

    #[test]
    fn test_decode_offset_timestamp() {
        let decoded: DataPoint =
            serde_json::from_str(r#"{"t":"2025-03-14T09:26:53+02:00","v":1.0}"#).unwrap();
        assert_eq!(
            decoded.t,
            Utc.with_ymd_and_hms(2025, 3, 14, 7, 26, 53).unwrap()
        );
    }
}
