//! Intersect candidate intervals with the observation window.

use crate::interval::{Interval, ObservationWindow};

/// Clip each interval to `window`, discarding those with no overlap.
///
/// Every returned interval satisfies
/// `window.start <= start < end <= window.end`. Input order is preserved.
pub fn clip_to_window(intervals: &[Interval], window: &ObservationWindow) -> Vec<Interval> {
    intervals
        .iter()
        .filter(|iv| iv.end() > window.start() && iv.start() < window.end())
        .filter_map(|iv| {
            Interval::new(
                iv.start().max(window.start()),
                iv.end().min(window.end()),
            )
        })
        .collect()
}
