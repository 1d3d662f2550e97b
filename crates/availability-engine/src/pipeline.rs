//! Per-resource availability pipeline.
//!
//! Chains the pure stages for a single resource:
//!
//! ```text
//! records -> candidates -> clip -> merge -> classify -> margin -> merge -> format
//! ```
//!
//! Fetching sits behind the [`BusyCalendar`] seam. A failed fetch never
//! reaches the caller: the resource is reported with the fail-open default.

use chrono::Duration;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::classify::is_fully_unavailable;
use crate::clip::clip_to_window;
use crate::error::{EngineError, Result};
use crate::format::format_intervals;
use crate::interval::ObservationWindow;
use crate::margin::apply_margin;
use crate::merge::merge_intervals;
use crate::record::{to_candidates, RawBusyRecord};

/// Default minimum free span, in minutes.
pub const DEFAULT_MIN_FREE_MINUTES: u32 = 30;
/// Default safety margin, in minutes.
pub const DEFAULT_MARGIN_MINUTES: u32 = 15;

/// Thresholds applied by the classifier and the margin corrector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityPolicy {
    /// Shortest free span that still counts as "available".
    pub min_free: Duration,
    /// Amount each conflict edge is pulled inward before display.
    pub margin: Duration,
}

impl AvailabilityPolicy {
    /// # Errors
    /// Returns [`EngineError::InvalidDuration`] when `min_free_minutes` is zero.
    pub fn from_minutes(min_free_minutes: u32, margin_minutes: u32) -> Result<Self> {
        if min_free_minutes == 0 {
            return Err(EngineError::InvalidDuration(
                "minimum free duration must be at least one minute".to_string(),
            ));
        }
        Ok(Self {
            min_free: Duration::minutes(i64::from(min_free_minutes)),
            margin: Duration::minutes(i64::from(margin_minutes)),
        })
    }
}

impl Default for AvailabilityPolicy {
    fn default() -> Self {
        Self {
            min_free: Duration::minutes(i64::from(DEFAULT_MIN_FREE_MINUTES)),
            margin: Duration::minutes(i64::from(DEFAULT_MARGIN_MINUTES)),
        }
    }
}

/// The published availability of one resource.
///
/// The default value is the fail-open result used when a resource's calendar
/// cannot be read: not blocked, no conflicts listed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResult {
    /// No free span of the minimum length anywhere in the window.
    #[serde(rename = "no_availability_all_day")]
    pub fully_unavailable: bool,
    /// Margin-corrected conflicts, e.g. `"10:15–10:45, 14:15–15:45"`.
    /// Always empty when `fully_unavailable` is set.
    #[serde(rename = "conflict_tijden")]
    pub conflict_summary: String,
}

/// Source of raw busy records for a resource.
pub trait BusyCalendar {
    type Error: std::error::Error;

    /// Fetch the busy records of `resource_id` overlapping `window`.
    fn fetch(
        &mut self,
        resource_id: i64,
        window: &ObservationWindow,
    ) -> std::result::Result<Vec<RawBusyRecord>, Self::Error>;
}

/// Reduce raw records to the published result for one resource.
pub fn evaluate_records(
    records: &[RawBusyRecord],
    window: &ObservationWindow,
    policy: &AvailabilityPolicy,
    tz: Tz,
) -> AvailabilityResult {
    let candidates = to_candidates(records, tz);
    let busy = merge_intervals(&clip_to_window(&candidates, window));

    if is_fully_unavailable(&busy, window, policy.min_free) {
        return AvailabilityResult {
            fully_unavailable: true,
            conflict_summary: String::new(),
        };
    }

    let conflicts = apply_margin(&busy, window, policy.margin);
    AvailabilityResult {
        fully_unavailable: false,
        conflict_summary: format_intervals(&conflicts, tz),
    }
}

/// Fetch and evaluate one resource, falling back to the default result when
/// the calendar cannot be read.
pub fn availability_for<C: BusyCalendar>(
    calendar: &mut C,
    resource_id: i64,
    window: &ObservationWindow,
    policy: &AvailabilityPolicy,
    tz: Tz,
) -> AvailabilityResult {
    match calendar.fetch(resource_id, window) {
        Ok(records) => evaluate_records(&records, window, policy, tz),
        Err(err) => {
            warn!(resource_id, error = %err, "calendar fetch failed, reporting resource as unrestricted");
            AvailabilityResult::default()
        }
    }
}
