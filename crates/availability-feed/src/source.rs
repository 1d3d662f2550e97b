//! Resource source: the vehicle list kept in a spreadsheet.
//!
//! Rows are read either from the Google Sheets values API or from a file
//! holding the same `{"values": [[...], ...]}` document. The first row is a
//! header. Columns: licence plate, city, (unused), franchise, resource id.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

const PLATE_COLUMN: usize = 0;
const RESOURCE_ID_COLUMN: usize = 4;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Sheets API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to read values file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid values document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Access token variable {0} is not set")]
    MissingToken(String),

    #[error("Sheet source misconfigured: {0}")]
    Config(String),
}

/// A vehicle to evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub resource_id: i64,
    /// Key in the output artifact.
    pub display_key: String,
}

pub trait ResourceSource {
    fn list(&self) -> Result<Vec<Resource>, SourceError>;
}

/// Body of a `spreadsheets.values.get` response.
#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Reads the vehicle list through the Sheets v4 values endpoint.
pub struct SheetsSource {
    http: Client,
    url: Url,
    token: String,
}

impl SheetsSource {
    pub fn new(
        api_base: &str,
        spreadsheet_id: &str,
        range: &str,
        token: String,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let mut url = Url::parse(api_base)
            .map_err(|e| SourceError::Config(format!("invalid Sheets API base {api_base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| SourceError::Config(format!("Sheets API base {api_base} cannot hold a path")))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", spreadsheet_id, "values", range]);

        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, url, token })
    }

    /// Read the bearer token from the environment variable `token_env`.
    pub fn token_from_env(token_env: &str) -> Result<String, SourceError> {
        std::env::var(token_env).map_err(|_| SourceError::MissingToken(token_env.to_string()))
    }
}

impl ResourceSource for SheetsSource {
    fn list(&self) -> Result<Vec<Resource>, SourceError> {
        let range: ValueRange = self
            .http
            .get(self.url.clone())
            .bearer_auth(&self.token)
            .send()?
            .error_for_status()?
            .json()?;
        Ok(resources_from_rows(&range.values))
    }
}

/// Reads the vehicle list from an exported values document.
pub struct ValuesFileSource {
    path: PathBuf,
}

impl ValuesFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ResourceSource for ValuesFileSource {
    fn list(&self) -> Result<Vec<Resource>, SourceError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        let range: ValueRange = serde_json::from_str(&text)?;
        Ok(resources_from_rows(&range.values))
    }
}

/// Turn sheet rows (header first) into resources, skipping rows without a
/// numeric resource id.
fn resources_from_rows(rows: &[Vec<Value>]) -> Vec<Resource> {
    rows.iter()
        .skip(1)
        .filter_map(|row| {
            let rid = row.get(RESOURCE_ID_COLUMN).map(cell_text).unwrap_or_default();
            let resource_id = match rid.trim().parse::<i64>() {
                Ok(id) => id,
                Err(_) => {
                    if !rid.is_empty() {
                        debug!(rid = %rid, "skipping row with non-numeric resource id");
                    }
                    return None;
                }
            };
            let plate = row.get(PLATE_COLUMN).map(cell_text).unwrap_or_default();
            Some(Resource {
                resource_id,
                display_key: display_key(&plate, resource_id),
            })
        })
        .collect()
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Licence plate without spaces or dashes, upper-cased: `"ab-12 cd"` → `"AB12CD"`.
pub fn clean_license(plate: &str) -> String {
    plate
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .flat_map(char::to_uppercase)
        .collect()
}

/// Cleaned plate, or `ID-<resource_id>` when the row has no usable plate.
fn display_key(plate: &str, resource_id: i64) -> String {
    let cleaned = clean_license(plate);
    if cleaned.is_empty() {
        format!("ID-{resource_id}")
    } else {
        cleaned
    }
}
