/// Timestamp wire format
///
/// The backend speaks RFC 3339 with millisecond precision and a `Z` suffix
/// (`2024-05-01T12:30:00.000Z`). Parsing accepts any RFC 3339 timestamp and
/// normalizes it to UTC.

use chrono::{DateTime, SecondsFormat, Utc};

/// Render a timestamp the way the backend expects it.
pub fn format(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse(raw: &str) -> chrono::ParseResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw).map(|t| t.with_timezone(&Utc))
}

/// Serde adapter for fields carried in the wire timestamp format.
pub mod serde_rfc3339 {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(t: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format(t))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_millisecond_z() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        assert_eq!(format(&t), "2024-05-01T12:30:00.000Z");
    }

    #[test]
    fn test_parse_offset_normalizes_to_utc() {
        let t = parse("2024-05-01T14:30:00.000+02:00").unwrap();
        assert_eq!(format(&t), "2024-05-01T12:30:00.000Z");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse("yesterday").is_err());
    }
}
