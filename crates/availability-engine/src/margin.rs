//! Shrink busy intervals inward by a safety margin.

use chrono::Duration;

use crate::interval::{Interval, ObservationWindow};
use crate::merge::merge_intervals;

/// Pull both edges of every interval inward by `margin`.
///
/// An edge that coincides exactly with the matching window edge is left in
/// place. Intervals that collapse to zero or negative length are dropped and
/// the survivors are merged again, so the output is a minimal disjoint set.
/// No output interval extends beyond its source interval.
pub fn apply_margin(
    busy: &[Interval],
    window: &ObservationWindow,
    margin: Duration,
) -> Vec<Interval> {
    let corrected: Vec<Interval> = busy
        .iter()
        .filter_map(|iv| {
            let start = if iv.start() == window.start() {
                iv.start()
            } else {
                iv.start() + margin
            };
            let end = if iv.end() == window.end() {
                iv.end()
            } else {
                iv.end() - margin
            };
            Interval::new(start, end)
        })
        .collect();

    merge_intervals(&corrected)
}
