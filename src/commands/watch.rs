use anyhow::{Context, Result};
use std::io;
use std::path::Path;

use crate::config::{self, Overrides, WatchConfig};
use crate::decode::Decoder;
use crate::fetch::HttpSource;
use crate::notify::WebhookNotifier;
use crate::poller::{PollState, Poller, PollerConfig};

/// Poll the status source and report changes until interrupted
pub fn execute(config_path: Option<&Path>, overrides: Overrides, max_polls: Option<u64>) -> Result<()> {
    let file = config::load(config_path)?;
    let config = WatchConfig::resolve(file, overrides)?;

    let source = HttpSource::new(config.url.as_str())?;
    let notifier = config
        .webhook
        .as_ref()
        .map(|target| WebhookNotifier::new(target.url.as_str(), target.channel.clone()))
        .transpose()
        .context("Failed to set up webhook notifier")?;

    tracing::info!(
        url = %config.url,
        format = %config.format,
        interval_secs = config.interval.as_secs(),
        notify = notifier.is_some(),
        "watching detector status"
    );

    let poller_config = PollerConfig {
        interval: config.interval,
        backoff: config.backoff,
        max_polls,
    };
    let decoder = Decoder::new(config.format, config.detectors);

    let stdout = io::stdout();
    let mut poller = Poller::new(&source, decoder, poller_config, stdout.lock());
    if let Some(notifier) = &notifier {
        poller = poller.with_notifier(notifier);
    }

    poller
        .run(PollState::default(), &mut std::thread::sleep)
        .context("Status polling stopped")?;

    Ok(())
}
