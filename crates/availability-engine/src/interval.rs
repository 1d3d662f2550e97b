//! Interval and observation-window value types.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::Serialize;

use crate::error::{EngineError, Result};

/// A closed-open busy range `[start, end)`.
///
/// Constructed only through [`Interval::new`], so a stored interval always has
/// `start < end`. Stages never mutate an interval; they build new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Interval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Interval {
    /// Build an interval, or `None` when it would have zero or negative length.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

/// The forward-looking span over which availability is judged for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObservationWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl ObservationWindow {
    /// # Errors
    /// Returns [`EngineError::EmptyWindow`] unless `start < end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(EngineError::EmptyWindow {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// Window of `hours` starting at `now`, with `now` truncated to the minute.
    ///
    /// # Errors
    /// Returns [`EngineError::EmptyWindow`] when `hours` is zero.
    pub fn starting_at(now: DateTime<Utc>, hours: u32) -> Result<Self> {
        let start = now
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);
        Self::new(start, start + Duration::hours(i64::from(hours)))
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}
