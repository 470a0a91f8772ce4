/// Detectors tracked when no allow-list is configured
pub const DEFAULT_DETECTORS: &[&str] = &[
    "GEO 600",
    "LIGO Hanford",
    "LIGO Livingston",
    "Virgo",
    "KAGRA",
];

/// Status strings that mean the instrument is taking data
pub const OBSERVING_STATUSES: &[&str] = &["Observing", "Science"];

/// Case-insensitive marker for a detector reporting an internal error
pub const ERROR_MARKER: &str = "error";

/// Status page scraped when the HTML format is selected and no URL is given
pub const DEFAULT_HTML_URL: &str =
    "https://ldas-jobs.ligo.caltech.edu/~gwistat/gwistat/gwistat.html";

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
