//! Run driver: walk the resource list, evaluate each vehicle, publish the artifact.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use availability_engine::{
    availability_for, AvailabilityPolicy, AvailabilityResult, BusyCalendar, ObservationWindow,
};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::source::Resource;

/// Everything the driver needs besides the resources and the calendar.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub window: ObservationWindow,
    pub policy: AvailabilityPolicy,
    pub tz: Tz,
    /// Pause after each resource.
    pub pause: Duration,
    /// Stop issuing fetches once this much time has passed.
    pub budget: Duration,
}

/// Display key → result, in source order. A repeated key replaces the
/// earlier value in place.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Artifact {
    entries: Map<String, Value>,
}

impl Artifact {
    pub fn insert(&mut self, key: String, result: &AvailabilityResult) -> Result<()> {
        let value = serde_json::to_value(result)
            .with_context(|| format!("Failed to serialize availability for {}", key))?;
        self.entries.insert(key, value);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pretty-printed JSON, written to `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize availability")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write file: {}", path.display()))
    }
}

/// Outcome of one run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub artifact: Artifact,
    /// Resources never fetched because the run budget ran out.
    pub skipped: usize,
}

/// Evaluate every resource in order, pausing between requests.
pub fn run<C: BusyCalendar>(
    resources: &[Resource],
    calendar: &mut C,
    settings: &RunSettings,
) -> Result<RunReport> {
    let deadline = Instant::now() + settings.budget;
    let total = resources.len();
    let mut report = RunReport::default();

    for (idx, resource) in resources.iter().enumerate() {
        if Instant::now() >= deadline {
            report.skipped = total - idx;
            warn!(
                skipped = report.skipped,
                budget_secs = settings.budget.as_secs(),
                "run deadline reached, publishing partial results"
            );
            break;
        }

        info!(
            "[{}/{}] {} ({})",
            idx + 1,
            total,
            resource.resource_id,
            resource.display_key
        );

        let result = availability_for(
            calendar,
            resource.resource_id,
            &settings.window,
            &settings.policy,
            settings.tz,
        );
        report
            .artifact
            .insert(resource.display_key.clone(), &result)?;

        if idx + 1 < total && !settings.pause.is_zero() {
            thread::sleep(settings.pause);
        }
    }

    Ok(report)
}
