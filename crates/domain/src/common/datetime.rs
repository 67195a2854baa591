//! DateTime parsing and wire formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Parses an RFC3339 timestamp string, returning an error if parsing fails.
///
/// # Examples
///
/// ```
/// use adventure_domain::common::parse_datetime;
/// use chrono::Datelike;
///
/// let dt = parse_datetime("2024-01-15T10:30:00.000Z").unwrap();
/// assert_eq!(dt.year(), 2024);
/// ```
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

/// Formats a timestamp as ISO-8601 with millisecond precision and a `Z` suffix,
/// the shape browser clients produce with `Date.prototype.toISOString`.
pub fn format_iso8601(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serde adapter for `DateTime<Utc>` fields carried on the wire.
///
/// Use with `#[serde(with = "crate::common::datetime::iso8601")]`.
pub mod iso8601 {
    use chrono::{DateTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_iso8601(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_datetime(&raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    #[test]
    fn test_parse_datetime_valid() {
        let dt = parse_datetime("2024-01-15T10:30:00Z").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_parse_datetime_with_timezone() {
        let dt = parse_datetime("2024-01-15T10:30:00+05:00").unwrap();
        assert_eq!(dt.hour(), 5);
    }

    #[test]
    fn test_parse_datetime_invalid() {
        assert!(parse_datetime("not-a-date").is_err());
        assert!(parse_datetime("").is_err());
        assert!(parse_datetime("2024-01-15").is_err());
    }

    #[test]
    fn test_format_iso8601_uses_millis_and_z() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 9, 8, 7, 6).unwrap();
        assert_eq!(format_iso8601(&dt), "2024-03-09T08:07:06.000Z");
    }
}
