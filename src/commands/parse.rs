use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::config;
use crate::decode::{Decoder, PayloadFormat};
use crate::report::format_report;

/// Decode a saved payload and print it, without touching the network
pub fn execute(
    file: &Path,
    format: Option<PayloadFormat>,
    config_path: Option<&Path>,
    as_json: bool,
) -> Result<()> {
    let file_config = config::load(config_path)?.unwrap_or_default();
    let format = format.or(file_config.format).unwrap_or_default();
    let decoder = Decoder::new(format, file_config.detector_list()?);

    let body = fs::read_to_string(file)
        .with_context(|| format!("Failed to read payload: {}", file.display()))?;
    let snapshot = decoder
        .decode(&body, Utc::now())
        .with_context(|| format!("Failed to decode {format} payload: {}", file.display()))?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", format_report(&snapshot, &BTreeSet::new()));
    }
    Ok(())
}
