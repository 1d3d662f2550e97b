//! Vehicle catalogue harvest via `resource.get`.
//!
//! Scans a range of resource ids, keeps the ones that carry a registration
//! plate, and merges them into a catalogue file keyed by id.

use std::collections::BTreeMap;
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::rpc::{FirstSample, RpcClient};

const METHOD: &str = "resource.get";

#[derive(Serialize)]
struct Params {
    resource: i64,
}

/// The subset of a `resource.get` result the catalogue keeps.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceInfo {
    registration_plate: Option<String>,
    brand: Option<String>,
    model: Option<String>,
    city: Option<String>,
    location: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    fuel_type: Option<String>,
    color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub plate: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub fuel_type: Option<String>,
    pub color: Option<String>,
}

impl CatalogEntry {
    fn from_info(id: i64, info: ResourceInfo) -> Option<Self> {
        let plate = info.registration_plate.filter(|p| !p.trim().is_empty())?;
        Some(Self {
            id,
            plate,
            brand: info.brand,
            model: info.model,
            city: info.city,
            street: info.location,
            latitude: info.latitude,
            longitude: info.longitude,
            fuel_type: info.fuel_type,
            color: info.color,
        })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeCounts {
    pub updated: usize,
    pub inserted: usize,
}

/// Fetch every id in `from..=to`, skipping failures and plate-less resources.
pub fn harvest(rpc: &RpcClient, from: i64, to: i64, pause: Duration) -> Vec<CatalogEntry> {
    let mut sample = FirstSample::armed();
    let mut found = Vec::new();

    for id in from..=to {
        match rpc.call::<_, ResourceInfo>(METHOD, &Params { resource: id }, &mut sample) {
            Ok(info) => match CatalogEntry::from_info(id, info) {
                Some(entry) => found.push(entry),
                None => debug!(id, "resource has no registration plate"),
            },
            Err(err) => warn!(id, error = %err, "resource lookup failed"),
        }

        if id < to && !pause.is_zero() {
            thread::sleep(pause);
        }
    }

    found
}

/// Merge `fresh` into `existing` by id. Output is sorted by city, then id;
/// entries without a city come first.
pub fn merge_catalog(
    existing: Vec<CatalogEntry>,
    fresh: Vec<CatalogEntry>,
) -> (Vec<CatalogEntry>, MergeCounts) {
    let mut by_id: BTreeMap<i64, CatalogEntry> =
        existing.into_iter().map(|entry| (entry.id, entry)).collect();
    let mut counts = MergeCounts::default();

    for entry in fresh {
        if by_id.insert(entry.id, entry).is_some() {
            counts.updated += 1;
        } else {
            counts.inserted += 1;
        }
    }

    let mut merged: Vec<CatalogEntry> = by_id.into_values().collect();
    merged.sort_by(|a, b| a.city.cmp(&b.city).then(a.id.cmp(&b.id)));
    (merged, counts)
}

/// Read a catalogue file, or an empty catalogue when it does not exist yet.
pub fn load_catalog(path: &Path) -> Result<Vec<CatalogEntry>> {
    if !path.exists() {
        info!(path = %path.display(), "no catalogue yet, starting a new one");
        return Ok(Vec::new());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid catalogue file: {}", path.display()))
}

pub fn write_catalog(path: &Path, entries: &[CatalogEntry]) -> Result<()> {
    let json = serde_json::to_string_pretty(entries).context("Failed to serialize catalogue")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write file: {}", path.display()))
}
