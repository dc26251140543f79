//! Timestamp encoding
//!
//! The remote API sends RFC 3339 strings both with and without a
//! fractional-second component. Both forms decode to a `DateTime<Utc>`
//! and compare at full precision.

use chrono::{DateTime, SecondsFormat, Utc};

/// Parse an RFC 3339 timestamp, with or without fractional seconds
pub fn parse(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

/// Format a timestamp for the wire (millisecond fraction, `Z` suffix)
pub fn format_wire(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Format a timestamp for local storage
///
/// Always nine fractional digits, so stored strings sort chronologically.
pub fn format_storage(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Serde adapter for `DateTime<Utc>` fields exchanged with the remote API
pub mod rfc3339 {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_wire(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse(&raw)
            .map_err(|e| de::Error::custom(format!("expected RFC 3339 timestamp, got {raw:?}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_with_fraction() {
        let dt = parse("2026-01-11T08:23:24.965Z").unwrap();
        assert_eq!(dt.timestamp_subsec_millis(), 965);
    }

    #[test]
    fn test_parse_without_fraction() {
        let dt = parse("2026-01-11T08:23:24Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2026, 1, 11, 8, 23, 24).unwrap());
    }

    #[test]
    fn test_fraction_compares_after_whole_second() {
        let whole = parse("2026-01-11T08:23:24Z").unwrap();
        let frac = parse("2026-01-11T08:23:24.001Z").unwrap();
        assert!(frac > whole);
    }

    #[test]
    fn test_parse_offset_normalizes_to_utc() {
        let dt = parse("2026-01-11T10:23:24+02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2026, 1, 11, 8, 23, 24).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse("yesterday").is_err());
        assert!(parse("2026-01-11").is_err());
    }

    #[test]
    fn test_storage_format_keeps_nanos() {
        let dt = Utc.timestamp_opt(1_768_119_804, 123_456_789).unwrap();
        assert_eq!(parse(&format_storage(&dt)).unwrap(), dt);
    }

    #[test]
    fn test_storage_format_sorts_as_text() {
        let whole = parse("2026-01-11T08:23:24Z").unwrap();
        let frac = parse("2026-01-11T08:23:24.5Z").unwrap();
        assert!(format_storage(&whole) < format_storage(&frac));
        assert_eq!(format_storage(&whole), "2026-01-11T08:23:24.000000000Z");
    }

    #[test]
    fn test_wire_format() {
        let dt = parse("2026-01-11T08:23:24.965Z").unwrap();
        assert_eq!(format_wire(&dt), "2026-01-11T08:23:24.965Z");
    }
}
