//! Feed configuration: an optional TOML file, every field defaulted.
//!
//! ```toml
//! api_url = "https://prod-api.mywheels.nl/api/"
//! timezone = "Europe/Amsterdam"
//! output = "availability.json"
//!
//! [window]
//! hours = 12
//! min_free_minutes = 30
//! margin_minutes = 15
//!
//! [http]
//! timeout_secs = 10
//! attempts = 3
//! retry_pause_ms = 300
//! pause_ms = 50
//! # deadline_secs = 600
//!
//! [sheet]
//! spreadsheet_id = "..."
//! range = "Data!A:E"
//! token_env = "SHEETS_ACCESS_TOKEN"
//! # values_file = "sheet.json"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use availability_engine::pipeline::{DEFAULT_MARGIN_MINUTES, DEFAULT_MIN_FREE_MINUTES};
use availability_engine::AvailabilityPolicy;
use chrono_tz::Tz;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://prod-api.mywheels.nl/api/";
pub const DEFAULT_TIMEZONE: &str = "Europe/Amsterdam";
pub const DEFAULT_SHEETS_API: &str = "https://sheets.googleapis.com";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid timezone: {0}")]
    Timezone(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    /// JSON-RPC endpoint of the booking API.
    pub api_url: String,
    /// IANA zone used for naive timestamps, request time frames and display.
    pub timezone: String,
    /// Where the availability artifact is written.
    pub output: PathBuf,
    pub window: WindowConfig,
    pub http: HttpConfig,
    pub sheet: SheetConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub hours: u32,
    pub min_free_minutes: u32,
    pub margin_minutes: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub attempts: u32,
    pub retry_pause_ms: u64,
    /// Pause after every resource, to stay under the provider's rate limit.
    pub pause_ms: u64,
    /// Whole-run budget. Derived from the per-resource worst case when unset.
    pub deadline_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetConfig {
    pub api_base: String,
    pub spreadsheet_id: Option<String>,
    pub range: String,
    /// Environment variable holding the OAuth bearer token.
    pub token_env: String,
    /// Read rows from an exported values file instead of the Sheets API.
    pub values_file: Option<PathBuf>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            output: PathBuf::from("availability.json"),
            window: WindowConfig::default(),
            http: HttpConfig::default(),
            sheet: SheetConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            hours: 12,
            min_free_minutes: DEFAULT_MIN_FREE_MINUTES,
            margin_minutes: DEFAULT_MARGIN_MINUTES,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            attempts: 3,
            retry_pause_ms: 300,
            pause_ms: 50,
            deadline_secs: None,
        }
    }
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_SHEETS_API.to_string(),
            spreadsheet_id: None,
            range: "Data!A:E".to_string(),
            token_env: "SHEETS_ACCESS_TOKEN".to_string(),
            values_file: None,
        }
    }
}

impl FeedConfig {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&text)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn tz(&self) -> Result<Tz, ConfigError> {
        parse_timezone(&self.timezone)
    }

    pub fn policy(&self) -> Result<AvailabilityPolicy, ConfigError> {
        AvailabilityPolicy::from_minutes(self.window.min_free_minutes, self.window.margin_minutes)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tz()?;
        self.policy()?;
        if self.window.hours == 0 {
            return Err(ConfigError::Invalid("window.hours must be at least 1".to_string()));
        }
        if self.http.attempts == 0 {
            return Err(ConfigError::Invalid("http.attempts must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_pause(&self) -> Duration {
        Duration::from_millis(self.retry_pause_ms)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    /// Longest a single resource can take: every attempt timing out, the
    /// pauses between attempts, and the pause after the resource.
    pub fn worst_case_per_resource(&self) -> Duration {
        let attempts = self.attempts.max(1);
        self.timeout() * attempts + self.retry_pause() * (attempts - 1) + self.pause()
    }

    /// The configured run deadline, or `resources` times the per-resource worst case.
    pub fn run_budget(&self, resources: usize) -> Duration {
        match self.deadline_secs {
            Some(secs) => Duration::from_secs(secs),
            None => self
                .worst_case_per_resource()
                .saturating_mul(u32::try_from(resources).unwrap_or(u32::MAX)),
        }
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz, ConfigError> {
    name.parse()
        .map_err(|_| ConfigError::Timezone(name.to_string()))
}
