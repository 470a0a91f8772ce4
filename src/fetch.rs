//! Fetching the upstream status resource with retry.
//!
//! Transport failures are sorted into transient and fatal. Transient ones are
//! retried with capped exponential backoff; the caller gets a snapshot, a
//! retryable failure once attempts run out, or a fatal failure.

use chrono::Utc;
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Deserialize;
use std::io::Read;
use std::time::Duration;

use crate::decode::Decoder;
use crate::error::{FetchError, SourceError};
use crate::models::Snapshot;

const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30; // connection + transfer
const MAX_BODY_SIZE: u64 = 2 * 1024 * 1024;

/// Where status bodies come from. Implemented over HTTP, and by scripted
/// sources in tests.
pub trait StatusSource {
    /// Fetch one raw body
    fn fetch_body(&self) -> Result<String, SourceError>;

    /// Human-readable location for logs
    fn describe(&self) -> String;
}

/// Capped exponential backoff for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub max: Duration,
    /// Total attempts per fetch, including the first
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(10),
            max: Duration::from_secs(300),
            max_attempts: 6,
        }
    }
}

impl BackoffPolicy {
    /// Delay before retry number `retry` (0 for the first retry)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.initial.saturating_mul(factor).min(self.max)
    }
}

/// Fetch and decode one snapshot, retrying transient source failures.
///
/// `sleep` is called between attempts; pass `std::thread::sleep` outside tests.
/// Decode failures are never retried.
pub fn fetch_snapshot<S>(
    source: &S,
    decoder: &Decoder,
    policy: &BackoffPolicy,
    sleep: &mut dyn FnMut(Duration),
) -> Result<Snapshot, FetchError>
where
    S: StatusSource + ?Sized,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match source.fetch_body() {
            Ok(body) => {
                tracing::debug!(bytes = body.len(), attempt, "fetched status body");
                return decoder.decode(&body, Utc::now()).map_err(FetchError::from);
            }
            Err(SourceError::Fatal(reason)) => return Err(FetchError::Fatal(reason)),
            Err(SourceError::Transient(reason)) if attempt >= max_attempts => {
                return Err(FetchError::Retryable {
                    attempts: attempt,
                    reason,
                });
            }
            Err(SourceError::Transient(reason)) => {
                let delay = policy.delay_for(attempt - 1);
                tracing::warn!(
                    source = %source.describe(),
                    attempt,
                    delay_secs = delay.as_secs_f64(),
                    "transient fetch failure, retrying: {reason}"
                );
                sleep(delay);
            }
        }
    }
}

/// Status source backed by a blocking HTTP GET.
pub struct HttpSource {
    client: Client,
    url: String,
    max_body_size: u64,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Result<Self, FetchError> {
        Ok(Self {
            client: create_http_client()?,
            url: url.into(),
            max_body_size: MAX_BODY_SIZE,
        })
    }

    pub fn with_max_body_size(mut self, max_body_size: u64) -> Self {
        self.max_body_size = max_body_size;
        self
    }
}

impl StatusSource for HttpSource {
    fn fetch_body(&self) -> Result<String, SourceError> {
        let response = self.client.get(&self.url).send().map_err(classify_transport)?;

        if let Some(err) = classify_status(response.status()) {
            return Err(err);
        }

        read_body_with_limit(response, self.max_body_size)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Create an HTTP client with connect and total request timeouts.
fn create_http_client() -> Result<Client, FetchError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
        .user_agent(concat!("gwstat/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| FetchError::Fatal(format!("Failed to create HTTP client: {e}")))
}

/// Map a non-success HTTP status to a source error.
///
/// Forbidden and rate-limited responses are how the upstream throttles
/// pollers, so they are transient along with timeouts and server errors.
pub fn classify_status(status: StatusCode) -> Option<SourceError> {
    if status.is_success() {
        return None;
    }

    let message = format!(
        "HTTP {} - {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown error")
    );

    let transient = status == StatusCode::FORBIDDEN
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error();

    Some(if transient {
        SourceError::Transient(message)
    } else {
        SourceError::Fatal(message)
    })
}

fn classify_transport(err: reqwest::Error) -> SourceError {
    if err.is_builder() || err.is_redirect() {
        SourceError::Fatal(err.to_string())
    } else {
        SourceError::Transient(err.to_string())
    }
}

/// Read the body, enforcing a size limit from Content-Length and while streaming.
///
/// The body is decoded with the charset named in Content-Type.
fn read_body_with_limit(response: Response, max_size: u64) -> Result<String, SourceError> {
    let charset = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(charset_of)
        .map(|charset| charset.to_ascii_lowercase());

    if let Some(content_length) = response.content_length() {
        if content_length > max_size {
            return Err(SourceError::Fatal(format!(
                "Content-Length {content_length} bytes exceeds maximum of {max_size} bytes"
            )));
        }
    }

    let mut bytes = Vec::new();
    response
        .take(max_size + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| SourceError::Transient(format!("Failed to read response body: {e}")))?;

    if bytes.len() as u64 > max_size {
        return Err(SourceError::Fatal(format!(
            "Response body exceeds maximum of {max_size} bytes"
        )));
    }

    Ok(decode_body(&bytes, charset.as_deref()))
}

/// The `charset` parameter of a Content-Type value
fn charset_of(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

/// Decode body bytes. Latin-1 maps byte for byte; anything else is read as
/// UTF-8 with invalid sequences replaced, since detector labels are ASCII.
pub fn decode_body(bytes: &[u8], charset: Option<&str>) -> String {
    match charset {
        Some("iso-8859-1" | "latin1" | "latin-1" | "iso_8859-1" | "us-ascii") => {
            bytes.iter().map(|&b| char::from(b)).collect()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Backoff settings as written in the config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackoffSettings {
    pub initial_secs: Option<u64>,
    pub max_secs: Option<u64>,
    pub max_attempts: Option<u32>,
}

impl BackoffSettings {
    pub fn apply(&self, base: BackoffPolicy) -> BackoffPolicy {
        BackoffPolicy {
            initial: self.initial_secs.map(Duration::from_secs).unwrap_or(base.initial),
            max: self.max_secs.map(Duration::from_secs).unwrap_or(base.max),
            max_attempts: self.max_attempts.unwrap_or(base.max_attempts),
        }
    }
}
