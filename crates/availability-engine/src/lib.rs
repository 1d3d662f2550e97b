//! # availability-engine
//!
//! Reduces a vehicle's booked calendar to a "free today?" signal.
//!
//! Busy intervals arrive overlapping, out of window, and in mixed timestamp
//! formats. The engine clips them to an observation window, merges them,
//! decides whether a free span of a minimum length remains, and renders the
//! remaining conflicts after pulling each one inward by a safety margin.
//!
//! ## Modules
//!
//! - [`interval`] — `Interval` and `ObservationWindow` value types
//! - [`clip`] — intersect intervals with the window
//! - [`merge`] — coalesce overlapping or touching intervals
//! - [`classify`] — find a free span of at least the minimum length
//! - [`margin`] — shrink conflicts inward by the safety margin
//! - [`format`] — `HH:MM–HH:MM, ...` rendering
//! - [`record`] — raw calendar records and timestamp parsing
//! - [`pipeline`] — per-resource orchestration and the fetch seam
//! - [`error`] — Error types

pub mod classify;
pub mod clip;
pub mod error;
pub mod format;
pub mod interval;
pub mod margin;
pub mod merge;
pub mod pipeline;
pub mod record;

pub use classify::{has_free_span, is_fully_unavailable};
pub use clip::clip_to_window;
pub use error::EngineError;
pub use format::format_intervals;
pub use interval::{Interval, ObservationWindow};
pub use margin::apply_margin;
pub use merge::merge_intervals;
pub use pipeline::{
    availability_for, evaluate_records, AvailabilityPolicy, AvailabilityResult, BusyCalendar,
};
pub use record::{parse_marker, RawBusyRecord};
