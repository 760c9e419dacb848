//! Companion bot API integration for the ttk time tracker.
//!
//! Fetches entries recorded remotely (e.g. via a chat bot) so they can
//! be imported into the local store, and acknowledges the ones that
//! were persisted so the server stops offering them.
//!
//! Every response arrives in a uniform envelope:
//!
//! ```json
//! { "success": true, "code": "...", "message": "...", "data": { ... } }
//! ```
//!
//! End times use the explicit valid/invalid pair `{"Time": ..., "Valid": ...}`
//! (or `null`); a pair with `"Valid": false` means the entry never got an
//! end time, regardless of what the `Time` field holds.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Import client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The provided base URL was invalid.
    #[error("invalid base URL: {reason}")]
    InvalidBaseUrl { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// API returned an error response.
    #[error("API error: {message}")]
    Api { message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Companion bot API client.
///
/// # Thread Safety
///
/// The client is safe to clone and share across threads. Each clone shares
/// the underlying HTTP connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Creates a new client for the given server base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is empty or whitespace-only, or
    /// if the HTTP client fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let mut base_url = base_url.into();

        if base_url.trim().is_empty() {
            return Err(ClientError::InvalidBaseUrl {
                reason: "base URL cannot be empty",
            });
        }
        while base_url.ends_with('/') {
            base_url.pop();
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(ClientError::ClientBuild)?;

        Ok(Self { http, base_url })
    }

    /// Fetches all entries the server has not yet handed out.
    pub async fn unimported_entries(&self) -> Result<EntriesResponse, ClientError> {
        let url = format!("{}/api/entries", self.base_url);
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_error_body(&body).unwrap_or_else(|| ClientError::Api {
                message: format!("status {status}: {body}"),
            }));
        }

        decode_data(decode_envelope(&body)?)
    }

    /// Acknowledges entries that were persisted locally.
    ///
    /// The server removes acknowledged IDs from the unimported set, so
    /// unacknowledged entries show up again on the next fetch.
    pub async fn mark_imported(&self, entry_ids: &[i64]) -> Result<MarkResponse, ClientError> {
        let url = format!("{}/api/entries/mark", self.base_url);
        let request = MarkRequest { entry_ids };
        let response = self.http.post(&url).json(&request).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_error_body(&body).unwrap_or_else(|| ClientError::Api {
                message: format!("status {status}: {body}"),
            }));
        }

        decode_data(decode_envelope(&body)?)
    }
}

/// One remote entry as served by the bot API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteEntry {
    pub id: i64,
    pub sheet: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<WireTime>,
    #[serde(default)]
    pub note: String,
}

impl RemoteEntry {
    /// The end time, if the entry actually has one.
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.end_time.as_ref().filter(|t| t.valid).map(|t| t.time)
    }
}

/// Go-style nullable timestamp: the `Time` field only counts when
/// `Valid` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WireTime {
    #[serde(rename = "Time")]
    pub time: DateTime<Utc>,
    #[serde(rename = "Valid")]
    pub valid: bool,
}

/// Data payload of a fetch: the server-side total plus the entries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntriesResponse {
    pub total: i64,
    pub entries: Vec<RemoteEntry>,
}

/// Data payload of an acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MarkResponse {
    pub imported_count: i64,
    pub remaining_count: i64,
}

#[derive(Debug, Serialize)]
struct MarkRequest<'a> {
    entry_ids: &'a [i64],
}

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    code: Option<String>,
    message: Option<String>,
    data: Option<serde_json::Value>,
}

fn decode_envelope(body: &str) -> Result<Envelope, ClientError> {
    serde_json::from_str(body).map_err(|err| ClientError::InvalidResponse(err.to_string()))
}

fn decode_data<T: serde::de::DeserializeOwned>(envelope: Envelope) -> Result<T, ClientError> {
    if !envelope.success {
        return Err(envelope_failure(&envelope));
    }
    let data = envelope
        .data
        .ok_or_else(|| ClientError::InvalidResponse("missing data payload".to_string()))?;
    serde_json::from_value(data).map_err(|err| ClientError::InvalidResponse(err.to_string()))
}

fn envelope_failure(envelope: &Envelope) -> ClientError {
    let message = envelope
        .message
        .clone()
        .or_else(|| envelope.code.clone())
        .unwrap_or_else(|| "request failed".to_string());
    ClientError::Api { message }
}

fn parse_error_body(body: &str) -> Option<ClientError> {
    serde_json::from_str::<Envelope>(body)
        .ok()
        .map(|envelope| envelope_failure(&envelope))
}
