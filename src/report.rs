//! Human-readable status reports for stdout.

use colored::Colorize;
use std::collections::BTreeSet;

use crate::models::Snapshot;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Render the snapshot as a multi-line report.
///
/// Detector names are right-aligned to the longest name. Members of `changed`
/// get a marker so a change report stands out from the initial printout.
pub fn format_report(snapshot: &Snapshot, changed: &BTreeSet<String>) -> String {
    let width = snapshot.longest_name();
    let mut out = format!(
        "{} {}:\n",
        "Status at".bold(),
        snapshot.captured_at.format(TIMESTAMP_FORMAT)
    );

    for (name, reading) in snapshot.iter() {
        let mut line = format!("  {name:>width$}: \"{}\"", reading.status);

        if reading.observing {
            line.push_str(&format!(" {}", "[observing]".green()));
        }
        if let Some(upstream) = &reading.upstream_error {
            line.push_str(&format!(
                " {}",
                format!("[held; upstream reports \"{upstream}\"]").red()
            ));
        } else if reading.error {
            line.push_str(&format!(" {}", "[error]".red()));
        }
        if changed.contains(name) {
            line.push_str(&format!(" {}", "<- changed".yellow().bold()));
        }

        out.push_str(&line);
        out.push('\n');
    }

    out
}

/// One-line summary of which detectors changed, for logs and notifications
pub fn change_summary(changed: &BTreeSet<String>) -> String {
    let names: Vec<&str> = changed.iter().map(String::as_str).collect();
    format!("Detector status changed: {}", names.join(", "))
}
