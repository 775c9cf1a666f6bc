//! Wall-clock and timestamp helpers.
//!
//! Planned times arrive as `HH:MM[:SS]` strings, real events as absolute
//! timestamps. Both are reduced to minutes since midnight so they can be
//! subtracted directly. No day rollover is applied.

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const CLOCK_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];

/// Parses an `HH:MM` or `HH:MM:SS[.fff]` clock string into minutes since midnight.
///
/// Seconds and fractions are accepted but dropped. A full timestamp is also
/// accepted, in which case only its time of day is used. Returns `None` for
/// anything else.
pub fn parse_clock_minutes(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    // A date part means a full timestamp.
    if value.contains(['T', ' ', '-']) {
        return parse_timestamp(value).map(|ts| minutes_of_day(&ts));
    }

    let time = CLOCK_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())?;

    Some(i64::from(time.hour()) * 60 + i64::from(time.minute()))
}

/// Parses an absolute timestamp, keeping the wall clock it was recorded in.
///
/// RFC 3339 values keep their own offset's local time; offset-less values
/// are taken as-is.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Minutes since midnight of a timestamp (`hour * 60 + minute`).
pub fn minutes_of_day(ts: &NaiveDateTime) -> i64 {
    i64::from(ts.hour()) * 60 + i64::from(ts.minute())
}

/// Formats minutes since midnight as `HH:MM`.
pub fn format_clock(minutes: i64) -> String {
    let minutes = minutes.rem_euclid(24 * 60);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Human readable signed delay, e.g. `+5 min`, `-3 min` or `on time`.
pub fn format_delay(minutes: i64) -> String {
    match minutes {
        0 => "on time".to_string(),
        m if m > 0 => format!("+{} min", m),
        m => format!("{} min", m),
    }
}

/// Serde adapter for optional timestamp fields.
pub(crate) fn de_opt_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", s))),
    }
}
