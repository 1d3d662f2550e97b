//! End-to-end tests for the per-resource pipeline.

use std::fmt;

use availability_engine::{
    availability_for, evaluate_records, AvailabilityPolicy, AvailabilityResult, BusyCalendar,
    ObservationWindow, RawBusyRecord,
};
use chrono::{Duration, TimeZone, Utc};
use chrono_tz::Tz;

// ── Helpers ─────────────────────────────────────────────────────────────────

/// The 09:00-19:00 UTC window on 2026-03-01.
fn day() -> ObservationWindow {
    ObservationWindow::new(
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 1, 19, 0, 0).unwrap(),
    )
    .unwrap()
}

fn busy(start: &str, end: &str) -> RawBusyRecord {
    RawBusyRecord::new(format!("2026-03-01 {start}"), format!("2026-03-01 {end}"))
}

fn evaluate(records: &[RawBusyRecord]) -> AvailabilityResult {
    evaluate_records(records, &day(), &AvailabilityPolicy::default(), Tz::UTC)
}

#[derive(Debug)]
struct Unreachable;

impl fmt::Display for Unreachable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("connection refused")
    }
}

impl std::error::Error for Unreachable {}

/// Calendar double that either serves fixed records or always fails.
struct FixedCalendar {
    records: Option<Vec<RawBusyRecord>>,
    calls: Vec<i64>,
}

impl BusyCalendar for FixedCalendar {
    type Error = Unreachable;

    fn fetch(
        &mut self,
        resource_id: i64,
        _window: &ObservationWindow,
    ) -> Result<Vec<RawBusyRecord>, Self::Error> {
        self.calls.push(resource_id);
        self.records.clone().ok_or(Unreachable)
    }
}

// ── Scenarios ───────────────────────────────────────────────────────────────

#[test]
fn single_booking_is_listed_with_margin() {
    let result = evaluate(&[busy("10:00", "11:00")]);
    assert!(!result.fully_unavailable);
    assert_eq!(result.conflict_summary, "10:15\u{2013}10:45");
}

#[test]
fn booking_covering_the_window_is_fully_unavailable() {
    let result = evaluate(&[busy("09:00", "19:00")]);
    assert!(result.fully_unavailable);
    assert_eq!(result.conflict_summary, "");
}

#[test]
fn touching_bookings_are_listed_once() {
    // Merged to 10:00-11:00, then shrunk by 15 minutes on both sides.
    let result = evaluate(&[busy("10:20", "11:00"), busy("10:00", "10:20")]);
    assert_eq!(result.conflict_summary, "10:15\u{2013}10:45");
}

#[test]
fn refuel_time_extends_the_booking() {
    // 12:00-12:30 + 20 → 12:00-12:50, shown as 12:15-12:35.
    let result = evaluate(&[busy("12:00", "12:30").with_extension(20.0)]);
    assert_eq!(result.conflict_summary, "12:15\u{2013}12:35");
}

#[test]
fn booking_at_window_start_keeps_its_start() {
    let result = evaluate(&[busy("09:00", "09:40")]);
    assert_eq!(result.conflict_summary, "09:00\u{2013}09:25");
}

#[test]
fn empty_calendar_is_free_with_no_conflicts() {
    assert_eq!(evaluate(&[]), AvailabilityResult::default());
}

#[test]
fn bookings_outside_the_window_are_ignored() {
    let records = [
        RawBusyRecord::new("2026-02-28 10:00", "2026-02-28 12:00"),
        RawBusyRecord::new("2026-03-01 19:00", "2026-03-01 22:00"),
    ];
    assert_eq!(evaluate(&records), AvailabilityResult::default());
}

#[test]
fn booking_running_past_the_window_keeps_the_window_end() {
    // Clipped to 17:00-19:00; the end touches the window and is not shrunk.
    let result = evaluate(&[busy("17:00", "23:00")]);
    assert_eq!(result.conflict_summary, "17:15\u{2013}19:00");
}

#[test]
fn fragmented_day_without_a_long_gap_is_fully_unavailable() {
    // Free holes of 20 minutes only.
    let records = [
        busy("09:20", "12:00"),
        busy("12:20", "15:00"),
        busy("15:20", "18:40"),
    ];
    let result = evaluate(&records);
    assert!(result.fully_unavailable);
    assert!(result.conflict_summary.is_empty());
}

#[test]
fn malformed_records_do_not_affect_the_result() {
    let records = [
        busy("10:00", "11:00"),
        RawBusyRecord::new("garbage", "2026-03-01 15:00"),
        RawBusyRecord {
            start: Some("2026-03-01 13:00".to_string()),
            end: None,
            extension_minutes: None,
        },
    ];
    assert_eq!(evaluate(&records).conflict_summary, "10:15\u{2013}10:45");
}

#[test]
fn huge_refuel_time_drops_only_that_booking() {
    let records = [
        busy("10:00", "11:00"),
        busy("14:00", "15:00").with_extension(1e12),
        busy("16:00", "17:00").with_extension(-1e300),
    ];
    assert_eq!(evaluate(&records).conflict_summary, "10:15\u{2013}10:45");
}

#[test]
fn custom_policy_is_respected() {
    let policy = AvailabilityPolicy::from_minutes(60, 0).unwrap();
    // Gaps: 09:00-09:45 (45 min), 18:30-19:00 (30 min) → no 60-minute span.
    let records = [busy("09:45", "18:30")];
    let result = evaluate_records(&records, &day(), &policy, Tz::UTC);
    assert!(result.fully_unavailable);

    let relaxed = AvailabilityPolicy::from_minutes(30, 0).unwrap();
    let result = evaluate_records(&records, &day(), &relaxed, Tz::UTC);
    assert_eq!(result.conflict_summary, "09:45\u{2013}18:30");
}

#[test]
fn zero_minimum_free_duration_is_rejected() {
    assert!(AvailabilityPolicy::from_minutes(0, 15).is_err());
}

#[test]
fn default_policy_is_thirty_and_fifteen_minutes() {
    let policy = AvailabilityPolicy::default();
    assert_eq!(policy.min_free, Duration::minutes(30));
    assert_eq!(policy.margin, Duration::minutes(15));
}

// ── Fetch seam ──────────────────────────────────────────────────────────────

#[test]
fn failed_fetch_falls_back_to_unrestricted() {
    let mut calendar = FixedCalendar {
        records: None,
        calls: Vec::new(),
    };
    let result = availability_for(
        &mut calendar,
        28_601,
        &day(),
        &AvailabilityPolicy::default(),
        Tz::UTC,
    );

    assert_eq!(result, AvailabilityResult::default());
    assert_eq!(calendar.calls, vec![28_601], "the pipeline must not retry");
}

#[test]
fn successful_fetch_is_evaluated() {
    let mut calendar = FixedCalendar {
        records: Some(vec![busy("09:00", "19:00")]),
        calls: Vec::new(),
    };
    let result = availability_for(
        &mut calendar,
        7,
        &day(),
        &AvailabilityPolicy::default(),
        Tz::UTC,
    );
    assert!(result.fully_unavailable);
}

#[test]
fn result_serializes_with_artifact_field_names() {
    let result = AvailabilityResult {
        fully_unavailable: false,
        conflict_summary: "10:15\u{2013}10:45".to_string(),
    };
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "no_availability_all_day": false,
            "conflict_tijden": "10:15\u{2013}10:45",
        })
    );
}
