//! Change notifications for chat webhooks.
//!
//! Notifications are best-effort: the poll loop logs delivery failures and
//! carries on.

use reqwest::blocking::Client;
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Duration;

use crate::error::NotifyError;
use crate::models::Snapshot;
use crate::report::change_summary;

const WEBHOOK_TIMEOUT_SECS: u64 = 15;

/// Receives the full snapshot and the set of changed detectors.
pub trait Notifier {
    fn notify(&self, snapshot: &Snapshot, changed: &BTreeSet<String>) -> Result<(), NotifyError>;
}

/// Chat message as posted to the webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookMessage {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    pub attachments: Vec<Attachment>,
}

/// Per-detector block of a webhook message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub title: String,
    pub text: String,
    pub fallback: String,
    pub color: String,
}

/// Build the message for a change: one attachment per tracked detector.
pub fn build_message(
    snapshot: &Snapshot,
    changed: &BTreeSet<String>,
    channel: Option<&str>,
) -> WebhookMessage {
    let attachments = snapshot
        .iter()
        .map(|(name, reading)| {
            // An error outranks any upstream colour, including a held good one.
            let color = match &reading.color {
                _ if reading.error => "danger".to_string(),
                Some(color) => color.clone(),
                None if reading.observing => "good".to_string(),
                None => "warning".to_string(),
            };
            let text = match &reading.upstream_error {
                Some(upstream) => format!("{} (upstream reports \"{upstream}\")", reading.status),
                None => reading.status.clone(),
            };
            let title = if changed.contains(name) {
                format!("{name} (changed)")
            } else {
                name.to_string()
            };

            Attachment {
                title,
                fallback: format!("{name}: {text}"),
                text,
                color,
            }
        })
        .collect();

    WebhookMessage {
        text: format!(
            "{} ({})",
            change_summary(changed),
            snapshot.captured_at.format("%Y-%m-%d %H:%M UTC")
        ),
        channel: channel.map(str::to_string),
        attachments,
    }
}

/// Posts change messages to an incoming-webhook URL.
pub struct WebhookNotifier {
    client: Client,
    url: String,
    channel: Option<String>,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, channel: Option<String>) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(WEBHOOK_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
            channel,
        })
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, snapshot: &Snapshot, changed: &BTreeSet<String>) -> Result<(), NotifyError> {
        let message = build_message(snapshot, changed, self.channel.as_deref());
        let response = self.client.post(&self.url).json(&message).send()?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected {
                status: response.status().as_u16(),
            });
        }

        tracing::debug!(detectors = changed.len(), "webhook notification delivered");
        Ok(())
    }
}
