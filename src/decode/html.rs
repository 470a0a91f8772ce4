//! Scraping detector statuses out of the HTML status page.
//!
//! The page is a table of alternating label/value cells. Cells are matched
//! with regexes, which is enough for this one page and avoids a DOM parser.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

use crate::error::ParseError;
use crate::models::{DetectorReading, Snapshot};

static TD_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<td\b[^>]*>(.*?)</td\s*>").expect("Invalid regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("Invalid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex"));

/// Text of every non-empty `<td>` cell, in document order
pub fn table_cells(body: &str) -> Vec<String> {
    TD_CELL
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|inner| cell_text(inner.as_str()))
        .filter(|text| !text.is_empty())
        .collect()
}

fn cell_text(inner: &str) -> String {
    let text = TAG.replace_all(inner, " ");
    let text = decode_entities(&text);
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Decode the status page. The cell after each detector's label is its status.
///
/// The page has no usable timestamp, so the snapshot is stamped with `now`.
pub fn decode_html(body: &str, detectors: &[String], now: DateTime<Utc>) -> Result<Snapshot, ParseError> {
    let cells = table_cells(body);

    let mut readings = Vec::with_capacity(detectors.len());
    for name in detectors {
        let label = cells
            .iter()
            .position(|cell| cell == name)
            .ok_or_else(|| ParseError::MissingDetector(name.clone()))?;
        let status = cells
            .get(label + 1)
            .ok_or_else(|| ParseError::MissingStatus(name.clone()))?;
        readings.push((name.clone(), DetectorReading::new(status.as_str())));
    }

    Ok(Snapshot::from_readings(now, detectors, readings))
}
