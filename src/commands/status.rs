use anyhow::{Context, Result};
use colored::Colorize;
use std::collections::BTreeSet;
use std::path::Path;

use crate::config::{self, Overrides, WatchConfig};
use crate::decode::Decoder;
use crate::fetch::{fetch_snapshot, HttpSource};
use crate::report::format_report;

/// Fetch the current status once and print it
pub fn execute(config_path: Option<&Path>, overrides: Overrides) -> Result<()> {
    let file = config::load(config_path)?;
    let config = WatchConfig::resolve(file, overrides)?;

    let source = HttpSource::new(config.url.as_str())?;
    let decoder = Decoder::new(config.format, config.detectors);

    let snapshot = fetch_snapshot(&source, &decoder, &config.backoff, &mut std::thread::sleep)
        .with_context(|| format!("Failed to fetch status from {}", config.url))?;

    print!("{}", format_report(&snapshot, &BTreeSet::new()));

    let observing = snapshot.iter().filter(|(_, r)| r.observing).count();
    println!(
        "\n{} {}/{} detectors observing",
        "Summary:".bold(),
        observing,
        snapshot.len()
    );
    Ok(())
}
