//! Checkpoint cursors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Document id carried by the checkpoint of an empty collection.
pub const SENTINEL_ID: &str = "0";

/// A cursor marking the last write a client has synced up to.
///
/// Checkpoints are ordered by `(updated_at, id)`. A pull answers with the
/// documents positioned strictly after the client's checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    /// Id of the most recently written document.
    pub id: String,
    /// Server write stamp of that document.
    #[serde(with = "iso8601")]
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Creates a checkpoint.
    pub fn new(id: impl Into<String>, updated_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            updated_at,
        }
    }

    /// Creates the checkpoint reported for an empty collection.
    pub fn sentinel(started_at: DateTime<Utc>) -> Self {
        Self::new(SENTINEL_ID, started_at)
    }

    /// Returns true if this checkpoint is positioned strictly before `other`.
    pub fn is_before(&self, other: &Checkpoint) -> bool {
        self < other
    }
}

impl Ord for Checkpoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.updated_at
            .cmp(&other.updated_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Checkpoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// ISO-8601 formatting for checkpoint timestamps.
///
/// Output is RFC 3339 UTC with millisecond precision (`...T10:00:00.000Z`).
/// Input accepts any RFC 3339 offset, or a naive date-time read as UTC.
pub mod iso8601 {
    use crate::error::{ProtocolError, ProtocolResult};
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Formats a timestamp for the wire.
    pub fn format(at: &DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Parses a wire timestamp.
    pub fn parse(raw: &str) -> ProtocolResult<DateTime<Utc>> {
        let trimmed = raw.trim();
        if let Ok(at) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(at.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| Utc.from_utc_datetime(&naive))
            .map_err(|_| ProtocolError::InvalidTimestamp(raw.to_string()))
    }

    /// Serde serializer.
    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(at))
    }

    /// Serde deserializer.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn ordering_uses_time_then_id() {
        let a = Checkpoint::new("b", at(10));
        let b = Checkpoint::new("a", at(11));
        let c = Checkpoint::new("c", at(11));

        assert!(a.is_before(&b));
        assert!(b.is_before(&c));
        assert!(!c.is_before(&c));
    }

    #[test]
    fn wire_format_is_camel_case_with_millis() {
        let checkpoint = Checkpoint::new("5", at(1_732_528_800));
        let json = serde_json::to_value(&checkpoint).unwrap();

        assert_eq!(json["id"], "5");
        assert_eq!(json["updatedAt"], "2024-11-25T10:00:00.000Z");
    }

    #[test]
    fn parses_offsets_and_naive_timestamps() {
        let utc = iso8601::parse("2024-11-25T10:00:00.000Z").unwrap();
        let offset = iso8601::parse("2024-11-25T12:00:00+02:00").unwrap();
        let naive = iso8601::parse("2024-11-25T10:00:00").unwrap();

        assert_eq!(utc, offset);
        assert_eq!(utc, naive);
    }

    #[test]
    fn rejects_garbage_timestamp() {
        assert!(iso8601::parse("yesterday").is_err());

        let result: Result<Checkpoint, _> =
            serde_json::from_str(r#"{"id":"1","updatedAt":"not a date"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn sentinel_checkpoint() {
        let sentinel = Checkpoint::sentinel(at(0));
        assert_eq!(sentinel.id, SENTINEL_ID);
    }
}
