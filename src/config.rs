//! Configuration: built-in defaults, an optional TOML file, and CLI overrides.
//!
//! CLI values win over the file, and the file wins over defaults.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::decode::PayloadFormat;
use crate::error::ConfigError;
use crate::fetch::{BackoffPolicy, BackoffSettings};
use crate::models::constants::{DEFAULT_DETECTORS, DEFAULT_HTML_URL, DEFAULT_POLL_INTERVAL_SECS};

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub url: Option<String>,
    pub format: Option<PayloadFormat>,
    pub interval_secs: Option<u64>,
    pub detectors: Option<Vec<String>>,
    pub webhook: Option<WebhookSection>,
    pub backoff: BackoffSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookSection {
    pub url: String,
    pub channel: Option<String>,
}

impl FileConfig {
    /// Configured detector allow-list, or the built-in one
    pub fn detector_list(&self) -> Result<Vec<String>, ConfigError> {
        let detectors = self
            .detectors
            .clone()
            .unwrap_or_else(|| DEFAULT_DETECTORS.iter().map(|s| s.to_string()).collect());

        if detectors.is_empty() {
            return Err(ConfigError::Invalid("detector list is empty".to_string()));
        }
        if detectors.iter().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::Invalid("detector names must not be blank".to_string()));
        }
        Ok(detectors)
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub format: Option<PayloadFormat>,
    pub interval_secs: Option<u64>,
    pub webhook: Option<String>,
    pub channel: Option<String>,
}

/// Where notifications go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookTarget {
    pub url: String,
    pub channel: Option<String>,
}

/// Fully resolved settings for a poller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    pub url: String,
    pub format: PayloadFormat,
    pub interval: Duration,
    pub detectors: Vec<String>,
    pub backoff: BackoffPolicy,
    pub webhook: Option<WebhookTarget>,
}

impl WatchConfig {
    /// Layer the file and CLI values over the defaults and validate the result
    pub fn resolve(file: Option<FileConfig>, overrides: Overrides) -> Result<Self, ConfigError> {
        let file = file.unwrap_or_default();

        let detectors = file.detector_list()?;

        let format = overrides.format.or(file.format).unwrap_or_default();
        let url = match (overrides.url.or(file.url), format) {
            (Some(url), _) => url,
            (None, PayloadFormat::Html) => DEFAULT_HTML_URL.to_string(),
            (None, PayloadFormat::Json) => {
                return Err(ConfigError::Invalid(
                    "the json format needs a status URL (--url or `url` in the config file)"
                        .to_string(),
                ))
            }
        };

        let interval_secs = overrides
            .interval_secs
            .or(file.interval_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        if interval_secs == 0 {
            return Err(ConfigError::Invalid("poll interval must be at least 1 second".to_string()));
        }

        let backoff = file.backoff.apply(BackoffPolicy::default());
        if backoff.max_attempts == 0 {
            return Err(ConfigError::Invalid("backoff.max_attempts must be at least 1".to_string()));
        }

        let file_webhook = file.webhook;
        let webhook_url = overrides
            .webhook
            .or_else(|| file_webhook.as_ref().map(|w| w.url.clone()));
        let channel = overrides
            .channel
            .or_else(|| file_webhook.and_then(|w| w.channel));
        let webhook = match (webhook_url, channel) {
            (Some(url), channel) => Some(WebhookTarget { url, channel }),
            (None, Some(_)) => {
                return Err(ConfigError::Invalid("a channel was given without a webhook URL".to_string()))
            }
            (None, None) => None,
        };

        Ok(Self {
            url,
            format,
            interval: Duration::from_secs(interval_secs),
            detectors,
            backoff,
            webhook,
        })
    }
}

/// Default location of the config file, e.g. `~/.config/gwstat/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gwstat").join("config.toml"))
}

/// Parse a config file
pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the config file named on the command line, or the default one.
///
/// # Returns
/// * `Ok(Some(_))` - a config file was found and parsed
/// * `Ok(None)` - no path was given and the default file does not exist
/// * `Err(_)` - the file could not be read or parsed; an explicit path that
///   does not exist is an error
pub fn load(explicit: Option<&Path>) -> Result<Option<FileConfig>, ConfigError> {
    if let Some(path) = explicit {
        return load_file_config(path).map(Some);
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            tracing::debug!(path = %path.display(), "loading config file");
            load_file_config(&path).map(Some)
        }
        _ => Ok(None),
    }
}
