//! Raw busy records as delivered by a booking calendar, and their conversion
//! into candidate [`Interval`]s.
//!
//! Records are tolerant by nature: a missing or unparsable marker drops the
//! record, it never fails the resource.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::interval::Interval;

/// Formats carrying an explicit UTC offset. A trailing `Z` is rewritten to
/// `+00:00` before these are tried.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

/// Formats without an offset; interpreted as wall-clock time in the calendar's zone.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// One busy entry from the booking calendar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBusyRecord {
    /// Start marker, ISO-8601 or `YYYY-MM-DD HH:MM`.
    pub start: Option<String>,
    /// End marker, same formats as `start`.
    pub end: Option<String>,
    /// Servicing time (refuel, turnaround) appended to the end marker.
    pub extension_minutes: Option<f64>,
}

impl RawBusyRecord {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
            extension_minutes: None,
        }
    }

    pub fn with_extension(mut self, minutes: f64) -> Self {
        self.extension_minutes = Some(minutes);
        self
    }

    /// The effective busy interval, or `None` when a marker is missing or
    /// unparsable, the extension pushes the end out of range, or the record
    /// has no positive length.
    pub fn to_interval(&self, tz: Tz) -> Option<Interval> {
        let start = parse_marker(self.start.as_deref()?, tz)?;
        let mut end = parse_marker(self.end.as_deref()?, tz)?;

        if let Some(minutes) = self.extension_minutes.filter(|m| m.is_finite()) {
            end = end.checked_add_signed(extension(minutes)?)?;
        }

        Interval::new(start, end)
    }
}

/// Whole milliseconds of `minutes`, or `None` past what a `Duration` can hold.
fn extension(minutes: f64) -> Option<Duration> {
    let millis = (minutes * 60_000.0).round();
    if !(i64::MIN as f64..i64::MAX as f64).contains(&millis) {
        return None;
    }
    Duration::try_milliseconds(millis as i64)
}

/// Parse a timestamp marker into a UTC instant.
///
/// Offset-carrying strings are taken at face value. Naive strings are local to
/// `tz`: an ambiguous local time (clocks going back) resolves to the earlier
/// instant, a local time inside a spring-forward gap does not exist and yields
/// `None`.
pub fn parse_marker(marker: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let marker = marker.trim();
    if marker.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(marker) {
        return Some(dt.with_timezone(&Utc));
    }

    let with_offset = match marker.strip_suffix('Z') {
        Some(rest) => format!("{rest}+00:00"),
        None => marker.to_string(),
    };
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&with_offset, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(marker, fmt).ok())
        .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Convert records into candidate intervals, silently dropping malformed ones.
pub fn to_candidates(records: &[RawBusyRecord], tz: Tz) -> Vec<Interval> {
    records
        .iter()
        .filter_map(|record| {
            let interval = record.to_interval(tz);
            if interval.is_none() {
                debug!(?record, "dropping malformed busy record");
            }
            interval
        })
        .collect()
}
