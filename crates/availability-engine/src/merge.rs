//! Coalesce busy intervals into a minimal disjoint ordered set.

use crate::interval::Interval;

/// Merge overlapping or touching intervals.
///
/// Input order does not matter. The output is sorted by start and no two
/// consecutive elements satisfy `a.end >= b.start`: an interval ending at
/// 10:00 and one starting at 10:00 become a single interval. Merging an
/// already merged sequence returns it unchanged.
pub fn merge_intervals(intervals: &[Interval]) -> Vec<Interval> {
    let mut sorted = intervals.to_vec();
    sorted.sort_by_key(|iv| iv.start());

    let mut merged: Vec<Interval> = Vec::with_capacity(sorted.len());
    for iv in sorted {
        if let Some(last) = merged.last_mut() {
            if iv.start() <= last.end() {
                // Overlapping or adjacent — extend the current interval.
                if iv.end() > last.end() {
                    if let Some(grown) = Interval::new(last.start(), iv.end()) {
                        *last = grown;
                    }
                }
                continue;
            }
        }
        merged.push(iv);
    }

    merged
}
