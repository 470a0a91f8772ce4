//! Turning upstream payload bodies into snapshots.
//!
//! Decoding is kept apart from the network fetch so saved payloads can be
//! checked offline and used as test fixtures.

mod html;
mod json;
mod timestamp;

pub use html::{decode_html, table_cells};
pub use json::decode_json;
pub use timestamp::parse_upstream_timestamp;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

use crate::error::ParseError;
use crate::models::Snapshot;

/// Shape of the upstream status resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// `{ "UTC": ..., "detectors": [...] }` document
    #[default]
    Json,
    /// Status page with label/value `<td>` cells
    Html,
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadFormat::Json => write!(f, "json"),
            PayloadFormat::Html => write!(f, "html"),
        }
    }
}

/// Decodes bodies of one format for a fixed detector allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoder {
    pub format: PayloadFormat,
    pub detectors: Vec<String>,
}

impl Decoder {
    pub fn new(format: PayloadFormat, detectors: Vec<String>) -> Self {
        Self { format, detectors }
    }

    /// Decode `body`, using `now` for the capture year (JSON) or time (HTML)
    pub fn decode(&self, body: &str, now: DateTime<Utc>) -> Result<Snapshot, ParseError> {
        match self.format {
            PayloadFormat::Json => decode_json(body, &self.detectors, now),
            PayloadFormat::Html => decode_html(body, &self.detectors, now),
        }
    }
}
