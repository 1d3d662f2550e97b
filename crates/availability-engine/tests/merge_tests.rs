//! Tests for interval merging and window clipping.

use availability_engine::{clip_to_window, merge_intervals, Interval, ObservationWindow};
use chrono::{DateTime, TimeZone, Utc};

/// Helper: an instant on 2026-03-01 (UTC).
fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, hour, min, 0).unwrap()
}

/// Helper: a busy interval on 2026-03-01.
fn iv(start_hour: u32, start_min: u32, end_hour: u32, end_min: u32) -> Interval {
    Interval::new(at(start_hour, start_min), at(end_hour, end_min)).unwrap()
}

fn window(start_hour: u32, end_hour: u32) -> ObservationWindow {
    ObservationWindow::new(at(start_hour, 0), at(end_hour, 0)).unwrap()
}

// ── Interval / window construction ──────────────────────────────────────────

#[test]
fn zero_length_interval_is_rejected() {
    assert!(Interval::new(at(10, 0), at(10, 0)).is_none());
    assert!(Interval::new(at(11, 0), at(10, 0)).is_none());
}

#[test]
fn empty_window_is_an_error() {
    assert!(ObservationWindow::new(at(10, 0), at(10, 0)).is_err());
    assert!(ObservationWindow::new(at(12, 0), at(10, 0)).is_err());
}

#[test]
fn window_starting_at_truncates_to_the_minute() {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 7, 42).unwrap();
    let w = ObservationWindow::starting_at(now, 12).unwrap();

    assert_eq!(w.start(), at(9, 7));
    assert_eq!(w.end(), at(21, 7));
    assert_eq!(w.duration().num_hours(), 12);
}

#[test]
fn window_of_zero_hours_is_an_error() {
    assert!(ObservationWindow::starting_at(at(9, 0), 0).is_err());
}

// ── Merger ──────────────────────────────────────────────────────────────────

#[test]
fn empty_input_merges_to_empty() {
    assert!(merge_intervals(&[]).is_empty());
}

#[test]
fn overlapping_intervals_are_merged() {
    // 10:00-11:30 and 11:00-12:00 → 10:00-12:00
    let merged = merge_intervals(&[iv(10, 0, 11, 30), iv(11, 0, 12, 0)]);
    assert_eq!(merged, vec![iv(10, 0, 12, 0)]);
}

#[test]
fn touching_intervals_are_merged() {
    // 10:00-10:20 and 10:20-11:00 touch at 10:20 → one interval.
    let merged = merge_intervals(&[iv(10, 0, 10, 20), iv(10, 20, 11, 0)]);
    assert_eq!(merged, vec![iv(10, 0, 11, 0)]);
}

#[test]
fn contained_interval_does_not_shrink_the_merge() {
    // 09:00-13:00 swallows 10:00-11:00.
    let merged = merge_intervals(&[iv(9, 0, 13, 0), iv(10, 0, 11, 0)]);
    assert_eq!(merged, vec![iv(9, 0, 13, 0)]);
}

#[test]
fn unsorted_input_comes_out_sorted_and_disjoint() {
    let merged = merge_intervals(&[
        iv(15, 0, 16, 0),
        iv(9, 0, 10, 0),
        iv(12, 0, 13, 0),
        iv(9, 30, 10, 30),
    ]);
    assert_eq!(
        merged,
        vec![iv(9, 0, 10, 30), iv(12, 0, 13, 0), iv(15, 0, 16, 0)]
    );
}

#[test]
fn merging_twice_changes_nothing() {
    let once = merge_intervals(&[iv(9, 0, 10, 0), iv(9, 45, 11, 0), iv(14, 0, 15, 0)]);
    let twice = merge_intervals(&once);
    assert_eq!(once, twice);
}

// ── Clipper ─────────────────────────────────────────────────────────────────

#[test]
fn intervals_outside_the_window_are_discarded() {
    // Window 09:00-19:00. 07:00-09:00 ends at the window start, 19:00-20:00
    // starts at the window end: neither overlaps.
    let clipped = clip_to_window(&[iv(7, 0, 9, 0), iv(19, 0, 20, 0)], &window(9, 19));
    assert!(clipped.is_empty());
}

#[test]
fn intervals_straddling_the_edges_are_clipped() {
    let clipped = clip_to_window(&[iv(8, 0, 10, 0), iv(18, 0, 21, 0)], &window(9, 19));
    assert_eq!(clipped, vec![iv(9, 0, 10, 0), iv(18, 0, 19, 0)]);
}

#[test]
fn interval_covering_the_window_becomes_the_window() {
    let clipped = clip_to_window(&[iv(6, 0, 22, 0)], &window(9, 19));
    assert_eq!(clipped, vec![iv(9, 0, 19, 0)]);
}

#[test]
fn inner_intervals_pass_through_in_order() {
    let input = [iv(14, 0, 15, 0), iv(10, 0, 11, 0)];
    let clipped = clip_to_window(&input, &window(9, 19));
    assert_eq!(clipped, input.to_vec());
}
