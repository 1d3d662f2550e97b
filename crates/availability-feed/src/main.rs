//! `availability-feed` CLI — publish per-vehicle availability for the map.
//!
//! ## Usage
//!
//! ```sh
//! # Full run: read the vehicle sheet, poll every calendar, write availability.json
//! SHEETS_ACCESS_TOKEN=... availability-feed --config feed.toml run
//!
//! # Same, with the vehicle list taken from an exported values file
//! availability-feed run --values-file sheet.json -o availability.json
//!
//! # Evaluate one calendar response offline (reads stdin if --records is omitted)
//! availability-feed evaluate --records slots.json --start "2026-03-01 09:00" --hours 10
//!
//! # Refresh the vehicle catalogue for a range of resource ids
//! availability-feed catalog --from 28600 --to 28799 -o catalog.json
//! ```
//!
//! Logs go to stderr; set `RUST_LOG` (default `info`) to change verbosity.
//! `RUST_LOG=debug` also dumps the first raw API response of a run.

mod calendar;
mod catalog;
mod config;
mod driver;
mod rpc;
mod source;

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use availability_engine::{evaluate_records, parse_marker, ObservationWindow, RawBusyRecord};
use chrono::{Duration, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::calendar::{CalendarClient, Slot};
use crate::config::FeedConfig;
use crate::driver::RunSettings;
use crate::rpc::{FirstSample, RpcClient};
use crate::source::{ResourceSource, SheetsSource, ValuesFileSource};

#[derive(Parser)]
#[command(
    name = "availability-feed",
    version,
    about = "Vehicle availability feed for the map"
)]
struct Cli {
    /// TOML configuration file (all settings have defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll every vehicle's calendar and write the availability artifact
    Run {
        /// Output file (overrides `output`)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Read the vehicle list from an exported values file instead of the Sheets API
        #[arg(long)]
        values_file: Option<PathBuf>,
        /// Booking API endpoint (overrides `api_url`)
        #[arg(long)]
        api_url: Option<String>,
        #[command(flatten)]
        window: WindowArgs,
        #[command(flatten)]
        http: HttpArgs,
    },
    /// Evaluate a single calendar response (a JSON array of slots)
    Evaluate {
        /// Slots file (reads from stdin if omitted)
        #[arg(short, long)]
        records: Option<String>,
        /// Window start, e.g. "2026-03-01 09:00" (local to the configured timezone)
        #[arg(long)]
        start: String,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Harvest vehicle details for a range of resource ids into a catalogue file
    Catalog {
        /// First resource id
        #[arg(long)]
        from: i64,
        /// Last resource id (inclusive)
        #[arg(long)]
        to: i64,
        /// Catalogue file; existing entries are updated in place
        #[arg(short, long, default_value = "catalog.json")]
        output: PathBuf,
        /// Booking API endpoint (overrides `api_url`)
        #[arg(long)]
        api_url: Option<String>,
        #[command(flatten)]
        http: HttpArgs,
    },
}

#[derive(Args)]
struct WindowArgs {
    /// Observation window length in hours
    #[arg(long)]
    hours: Option<u32>,
    /// Minimum free span, in minutes, for a vehicle to count as available
    #[arg(long)]
    min_free: Option<u32>,
    /// Safety margin, in minutes, taken off each side of a conflict
    #[arg(long)]
    margin: Option<u32>,
    /// IANA timezone for naive timestamps and display
    #[arg(long)]
    timezone: Option<String>,
}

#[derive(Args)]
struct HttpArgs {
    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Attempts per request
    #[arg(long)]
    attempts: Option<u32>,
    /// Pause between resources in milliseconds
    #[arg(long)]
    pause_ms: Option<u64>,
    /// Whole-run deadline in seconds
    #[arg(long)]
    deadline_secs: Option<u64>,
}

impl WindowArgs {
    fn apply(self, config: &mut FeedConfig) {
        if let Some(hours) = self.hours {
            config.window.hours = hours;
        }
        if let Some(min_free) = self.min_free {
            config.window.min_free_minutes = min_free;
        }
        if let Some(margin) = self.margin {
            config.window.margin_minutes = margin;
        }
        if let Some(timezone) = self.timezone {
            config.timezone = timezone;
        }
    }
}

impl HttpArgs {
    fn apply(self, config: &mut FeedConfig) {
        if let Some(timeout) = self.timeout_secs {
            config.http.timeout_secs = timeout;
        }
        if let Some(attempts) = self.attempts {
            config.http.attempts = attempts;
        }
        if let Some(pause) = self.pause_ms {
            config.http.pause_ms = pause;
        }
        if let Some(deadline) = self.deadline_secs {
            config.http.deadline_secs = Some(deadline);
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let mut config = FeedConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            output,
            values_file,
            api_url,
            window,
            http,
        } => {
            window.apply(&mut config);
            http.apply(&mut config);
            if let Some(output) = output {
                config.output = output;
            }
            if let Some(values_file) = values_file {
                config.sheet.values_file = Some(values_file);
            }
            if let Some(api_url) = api_url {
                config.api_url = api_url;
            }
            run_feed(&config)?;
        }
        Commands::Evaluate {
            records,
            start,
            output,
            window,
        } => {
            window.apply(&mut config);
            config.validate()?;
            let tz = config.tz()?;
            let policy = config.policy()?;

            let start = parse_marker(&start, tz)
                .with_context(|| format!("Invalid --start timestamp: {}", start))?;
            let window = ObservationWindow::new(
                start,
                start + Duration::hours(i64::from(config.window.hours)),
            )?;

            let json = read_input(records.as_deref())?;
            let slots: Vec<Slot> =
                serde_json::from_str(&json).context("Failed to parse slots (expected a JSON array)")?;
            let records: Vec<RawBusyRecord> = slots.into_iter().map(RawBusyRecord::from).collect();

            let result = evaluate_records(&records, &window, &policy, tz);
            let pretty = serde_json::to_string_pretty(&result)?;
            write_output(output.as_deref(), &pretty)?;
        }
        Commands::Catalog {
            from,
            to,
            output,
            api_url,
            http,
        } => {
            http.apply(&mut config);
            if let Some(api_url) = api_url {
                config.api_url = api_url;
            }
            if from > to {
                anyhow::bail!("--from ({}) must not be greater than --to ({})", from, to);
            }
            refresh_catalog(&config, from, to, &output)?;
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run_feed(config: &FeedConfig) -> Result<()> {
    config.validate()?;
    let tz = config.tz()?;
    let policy = config.policy()?;

    let window = ObservationWindow::starting_at(Utc::now(), config.window.hours)?;
    info!(
        start = %window.start().with_timezone(&tz),
        end = %window.end().with_timezone(&tz),
        hours = window.duration().num_hours(),
        "observation window"
    );

    let source = build_source(config)?;
    let resources = source.list().context("Failed to load the vehicle list")?;
    if resources.is_empty() {
        warn!("no vehicles to evaluate, nothing written");
        return Ok(());
    }
    info!(count = resources.len(), "vehicles loaded");

    let rpc = RpcClient::new(
        config.api_url.as_str(),
        config.http.timeout(),
        config.http.attempts,
        config.http.retry_pause(),
    )
    .context("Failed to build HTTP client")?;
    let mut calendar = CalendarClient::new(&rpc, tz, FirstSample::armed());

    let settings = RunSettings {
        window,
        policy,
        tz,
        pause: config.http.pause(),
        budget: config.http.run_budget(resources.len()),
    };
    let report = driver::run(&resources, &mut calendar, &settings)?;
    if report.artifact.is_empty() {
        warn!("no vehicle was evaluated before the deadline");
    }

    report.artifact.write_to(&config.output)?;
    info!(
        written = report.artifact.len(),
        skipped = report.skipped,
        path = %config.output.display(),
        "availability saved"
    );
    Ok(())
}

fn build_source(config: &FeedConfig) -> Result<Box<dyn ResourceSource>> {
    if let Some(path) = &config.sheet.values_file {
        return Ok(Box::new(ValuesFileSource::new(path)));
    }

    let spreadsheet_id = config
        .sheet
        .spreadsheet_id
        .as_deref()
        .context("No vehicle list configured: set sheet.spreadsheet_id or pass --values-file")?;
    let token = SheetsSource::token_from_env(&config.sheet.token_env)?;
    let source = SheetsSource::new(
        &config.sheet.api_base,
        spreadsheet_id,
        &config.sheet.range,
        token,
        config.http.timeout(),
    )?;
    Ok(Box::new(source))
}

fn refresh_catalog(config: &FeedConfig, from: i64, to: i64, output: &Path) -> Result<()> {
    config.validate()?;
    let rpc = RpcClient::new(
        config.api_url.as_str(),
        config.http.timeout(),
        config.http.attempts,
        config.http.retry_pause(),
    )
    .context("Failed to build HTTP client")?;

    let existing = catalog::load_catalog(output)?;
    info!(from, to, "harvesting vehicles");
    let fresh = catalog::harvest(&rpc, from, to, config.http.pause());
    let (merged, counts) = catalog::merge_catalog(existing, fresh);

    catalog::write_catalog(output, &merged)?;
    info!(
        updated = counts.updated,
        inserted = counts.inserted,
        total = merged.len(),
        path = %output.display(),
        "catalogue saved"
    );
    Ok(())
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
