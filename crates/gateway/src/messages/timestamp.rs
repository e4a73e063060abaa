//! ISO-8601 timestamps on the wire
//!
//! Emits RFC 3339 in UTC. Accepts RFC 3339 with any offset, or a naive
//! `YYYY-MM-DDTHH:MM:SS[.fraction]` which is taken as UTC.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use garage_core::Timestamp;
use serde::{Deserialize, Deserializer, Serializer, de::Error};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid ISO-8601 timestamp: {raw}")))
}

pub(crate) fn parse(raw: &str) -> Option<Timestamp> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(parse("2024-01-01T10:00:00Z"), Some(expected));
        assert_eq!(parse("2024-01-01T07:00:00-03:00"), Some(expected));
        assert_eq!(parse("2024-01-01T10:00:00"), Some(expected));
        assert_eq!(parse("2024-01-01 10:00:00"), Some(expected));
        assert_eq!(
            parse("2024-01-01T10:00:00.250000"),
            Some(expected + chrono::Duration::milliseconds(250))
        );
        assert_eq!(parse("yesterday"), None);
    }
}
