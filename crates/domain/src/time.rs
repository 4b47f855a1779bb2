use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::errors::Error;

/// Parse an instant given either as RFC 3339 or as a plain `YYYY-MM-DD` date
/// (midnight UTC).
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// Parse a 24-hour `HH:MM` clock time.
pub fn parse_clock_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

/// Inclusive range over scheduled times.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Build a range from optional query bounds. A range only exists when
    /// both bounds are present; a lone bound yields `None`.
    pub fn from_bounds(start: Option<&str>, end: Option<&str>) -> Result<Option<Self>, Error> {
        let (Some(start), Some(end)) = (non_blank(start), non_blank(end)) else {
            return Ok(None);
        };

        let start = parse_instant(start)
            .ok_or_else(|| Error::validation(format!("Invalid startDate: {start}")))?;
        let end = parse_instant(end)
            .ok_or_else(|| Error::validation(format!("Invalid endDate: {end}")))?;

        Ok(Some(Self { start, end }))
    }

    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        *instant >= self.start && *instant <= self.end
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Serde helper for optional instants accepting the same formats as
/// [`parse_instant`].
pub mod flexible_instant {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(value) => parse_instant(&value)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {value}"))),
        }
    }
}

/// Like [`flexible_instant`], but tells an absent field (`None`) apart from
/// an explicit `null` (`Some(None)`).
pub mod clearable_instant {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        flexible_instant::deserialize(deserializer).map(Some)
    }
}
