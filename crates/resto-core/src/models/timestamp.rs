//! Timestamp normalization
//!
//! The remote API hands out `createdAt`/`updatedAt` either as epoch
//! milliseconds or as ISO-8601 strings, sometimes both within one record.
//! Everything is normalized to epoch milliseconds on the way in.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A point in time as Unix epoch milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Wrap raw epoch milliseconds
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Epoch milliseconds
    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Current wall-clock time
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    /// Current time, but never earlier than one millisecond past `previous`.
    ///
    /// Local edits must leave `updatedAt` strictly ahead of the prior value
    /// even when the wall clock is coarse or skewed.
    pub fn now_after(previous: Self) -> Self {
        Self::now().max(Self(previous.0.saturating_add(1)))
    }

    /// Parse epoch milliseconds (as text) or an ISO-8601 date-time.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(millis) = raw.parse::<i64>() {
            return Some(Self(millis));
        }
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(Self(parsed.timestamp_millis()));
        }
        // Zone-less ISO strings are taken as UTC
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| Self(naive.and_utc().timestamp_millis()))
    }

    /// RFC 3339 rendering, or the raw millis when out of chrono's range
    pub fn to_rfc3339(self) -> String {
        DateTime::from_timestamp_millis(self.0)
            .map_or_else(|| self.0.to_string(), |date_time| date_time.to_rfc3339())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TimestampVisitor)
    }
}

struct TimestampVisitor;

impl Visitor<'_> for TimestampVisitor {
    type Value = Timestamp;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("epoch milliseconds or an ISO-8601 date-time string")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Timestamp, E> {
        Ok(Timestamp(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Timestamp, E> {
        i64::try_from(value)
            .map(Timestamp)
            .map_err(|_| E::custom(format!("timestamp {value} out of range")))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Timestamp, E> {
        if value.is_finite() {
            Ok(Timestamp(value as i64))
        } else {
            Err(E::custom("timestamp must be finite"))
        }
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Timestamp, E> {
        Timestamp::parse(value).ok_or_else(|| E::custom(format!("unrecognized timestamp '{value}'")))
    }
}
