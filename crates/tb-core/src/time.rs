//! # Timestamps
//!
//! All timestamps cross the API boundary as ISO-8601 local strings without
//! an offset (`YYYY-MM-DDTHH:MM:SS`). Internally they are `NaiveDateTime`
//! values at second precision, interpreted as UTC.

use chrono::{NaiveDateTime, Timelike};

use crate::error::{AppError, Result};

/// Wire format for every timestamp the core accepts or renders.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parses a timestamp in exactly [`TIMESTAMP_FORMAT`].
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).map_err(|_| {
        AppError::ValidationError(format!(
            "'{raw}' is not a timestamp of the form YYYY-MM-DDTHH:MM:SS"
        ))
    })
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Drops sub-second precision so stored values render back identically.
pub fn truncate_to_seconds(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_nanosecond(0).unwrap_or(ts)
}

/// `#[serde(with = "serde_timestamp")]` for `NaiveDateTime` fields.
pub mod serde_timestamp {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::{format_timestamp, TIMESTAMP_FORMAT};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(de::Error::custom)
    }
}
