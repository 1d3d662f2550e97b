//! Render conflict intervals for the dashboard.

use chrono_tz::Tz;

use crate::interval::Interval;

/// Separator between the two clock times of one interval (EN DASH).
pub const RANGE_SEPARATOR: char = '\u{2013}';

/// Format intervals as `HH:MM–HH:MM`, joined by `", "`, in the clock time of `tz`.
///
/// Only the time of day is shown, so an interval crossing midnight may read
/// backwards (`23:00–01:00`).
pub fn format_intervals(intervals: &[Interval], tz: Tz) -> String {
    intervals
        .iter()
        .map(|iv| {
            format!(
                "{}{}{}",
                iv.start().with_timezone(&tz).format("%H:%M"),
                RANGE_SEPARATOR,
                iv.end().with_timezone(&tz).format("%H:%M"),
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}
