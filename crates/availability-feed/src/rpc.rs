//! Blocking JSON-RPC 2.0 client for the booking API.
//!
//! One request object per call, one envelope object per response. Transport
//! failures and HTTP error statuses are retried up to the attempt budget;
//! a well-formed answer the server rejected, or a body that does not match
//! the envelope schema, is returned immediately.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(reqwest::StatusCode),

    #[error("Response is not JSON: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Unexpected response shape: {0}")]
    Schema(String),
}

impl RpcError {
    fn is_transient(&self) -> bool {
        matches!(self, RpcError::Transport(_) | RpcError::Status(_))
    }
}

/// Run-scoped switch for dumping the first raw response at debug level.
#[derive(Debug, Clone, Copy)]
pub struct FirstSample {
    pending: bool,
}

impl FirstSample {
    pub fn armed() -> Self {
        Self { pending: true }
    }

    /// `true` exactly once for an armed sample.
    fn take(&mut self) -> bool {
        std::mem::replace(&mut self.pending, false)
    }
}

#[derive(Serialize)]
struct Request<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a P,
}

#[derive(Deserialize)]
struct Envelope<R> {
    result: Option<R>,
    error: Option<ErrorObject>,
}

#[derive(Deserialize)]
struct ErrorObject {
    code: i64,
    message: String,
}

pub struct RpcClient {
    http: Client,
    url: String,
    attempts: u32,
    retry_pause: Duration,
}

impl RpcClient {
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        attempts: u32,
        retry_pause: Duration,
    ) -> Result<Self, RpcError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
            attempts: attempts.max(1),
            retry_pause,
        })
    }

    /// Call `method` and decode its `result` as `R`.
    pub fn call<P, R>(&self, method: &str, params: &P, sample: &mut FirstSample) -> Result<R, RpcError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let request = Request {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        let mut attempt = 1;
        let body = loop {
            match self.post(&request) {
                Ok(body) => break body,
                Err(err) if err.is_transient() && attempt < self.attempts => {
                    debug!(method, attempt, error = %err, "retrying");
                    attempt += 1;
                    thread::sleep(self.retry_pause);
                }
                Err(err) => {
                    if err.is_transient() {
                        warn!(method, attempts = self.attempts, error = %err, "giving up");
                    }
                    return Err(err);
                }
            }
        };

        if sample.take() {
            debug!(method, response = %body, "first raw response of this run");
        }

        decode_envelope(body)
    }

    fn post<P: Serialize>(&self, request: &Request<'_, P>) -> Result<Value, RpcError> {
        let response = self
            .http
            .post(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Status(status));
        }

        let text = response.text()?;
        serde_json::from_str(&text).map_err(RpcError::Decode)
    }
}

/// Validate a response body against the JSON-RPC envelope and extract `result`.
pub(crate) fn decode_envelope<R: DeserializeOwned>(body: Value) -> Result<R, RpcError> {
    if !body.is_object() {
        return Err(RpcError::Schema(format!(
            "expected a JSON-RPC envelope object, got {}",
            kind_of(&body)
        )));
    }

    let envelope: Envelope<R> =
        serde_json::from_value(body).map_err(|e| RpcError::Schema(e.to_string()))?;

    if let Some(error) = envelope.error {
        return Err(RpcError::Rpc {
            code: error.code,
            message: error.message,
        });
    }

    envelope
        .result
        .ok_or_else(|| RpcError::Schema("envelope has neither result nor error".to_string()))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
