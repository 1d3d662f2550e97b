//! Decide whether a window still holds a usable free span.
//!
//! Walks merged busy intervals with a cursor, the same sweep used to compute
//! free slots, but stops at the first gap of at least `min_free`.

use chrono::Duration;

use crate::interval::{Interval, ObservationWindow};

/// Returns `true` when some contiguous free span of at least `min_free`
/// exists inside `window`.
///
/// `busy` must be merged and clipped to `window`. A gap exactly as long as
/// `min_free` qualifies. With no busy intervals the answer depends only on the
/// window length.
pub fn has_free_span(busy: &[Interval], window: &ObservationWindow, min_free: Duration) -> bool {
    let mut cursor = window.start();

    for iv in busy {
        if iv.start() > cursor && iv.start() - cursor >= min_free {
            return true;
        }
        cursor = cursor.max(iv.end());
    }

    window.end() - cursor >= min_free
}

/// Inverse of [`has_free_span`]: no free span of at least `min_free` anywhere.
pub fn is_fully_unavailable(
    busy: &[Interval],
    window: &ObservationWindow,
    min_free: Duration,
) -> bool {
    !has_free_span(busy, window, min_free)
}
