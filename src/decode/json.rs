use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::timestamp::parse_upstream_timestamp;
use crate::error::ParseError;
use crate::models::{DetectorReading, Snapshot};

#[derive(Debug, Deserialize)]
struct StatusPayload {
    #[serde(rename = "UTC")]
    utc: String,
    detectors: Vec<SiteEntry>,
}

#[derive(Debug, Deserialize)]
struct SiteEntry {
    site: String,
    status: String,
    #[serde(default)]
    color: Option<String>,
}

/// Decode the JSON status document.
///
/// Sites outside `detectors` are ignored; every allow-listed detector must be present.
pub fn decode_json(body: &str, detectors: &[String], now: DateTime<Utc>) -> Result<Snapshot, ParseError> {
    let payload: StatusPayload = serde_json::from_str(body)?;
    let captured_at = parse_upstream_timestamp(&payload.utc, now)?;

    if let Some(missing) = detectors
        .iter()
        .find(|name| !payload.detectors.iter().any(|entry| entry.site.trim() == name.as_str()))
    {
        return Err(ParseError::MissingDetector(missing.clone()));
    }

    let readings = payload.detectors.into_iter().map(|entry| {
        let reading = DetectorReading::new(entry.status);
        let reading = match entry.color {
            Some(color) => reading.with_color(color),
            None => reading,
        };
        (entry.site.trim().to_string(), reading)
    });

    Ok(Snapshot::from_readings(captured_at, detectors, readings))
}
