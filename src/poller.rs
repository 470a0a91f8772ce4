//! The poll-diff-notify loop.
//!
//! The previous snapshot lives in a `PollState` value that each cycle consumes
//! and returns; there is no other state.

use anyhow::Result;
use std::collections::BTreeSet;
use std::io::Write;
use std::time::Duration;

use crate::decode::Decoder;
use crate::error::FetchError;
use crate::fetch::{fetch_snapshot, BackoffPolicy, StatusSource};
use crate::models::{diff, Snapshot};
use crate::notify::Notifier;
use crate::report::{change_summary, format_report};

/// What the loop remembers between cycles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollState {
    previous: Option<Snapshot>,
}

impl PollState {
    pub fn previous(&self) -> Option<&Snapshot> {
        self.previous.as_ref()
    }
}

/// Result of feeding one snapshot into the loop state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    /// First snapshot; nothing to compare against
    Initial(Snapshot),
    Unchanged(Snapshot),
    Changed {
        snapshot: Snapshot,
        changed: BTreeSet<String>,
    },
}

impl PollEvent {
    pub fn snapshot(&self) -> &Snapshot {
        match self {
            PollEvent::Initial(snapshot) | PollEvent::Unchanged(snapshot) => snapshot,
            PollEvent::Changed { snapshot, .. } => snapshot,
        }
    }
}

/// Reconcile `current` against the state, diff it, and return the new state.
pub fn advance(state: PollState, current: Snapshot) -> (PollState, PollEvent) {
    let current = current.reconcile(state.previous.as_ref());

    let event = match &state.previous {
        None => PollEvent::Initial(current.clone()),
        Some(previous) => {
            let changed = diff(previous, &current);
            if changed.is_empty() {
                PollEvent::Unchanged(current.clone())
            } else {
                PollEvent::Changed {
                    snapshot: current.clone(),
                    changed,
                }
            }
        }
    };

    (
        PollState {
            previous: Some(current),
        },
        event,
    )
}

/// Loop settings
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    pub backoff: BackoffPolicy,
    /// Stop after this many cycles; `None` polls forever
    pub max_polls: Option<u64>,
}

/// Drives a status source through the poll loop, writing reports to `out`.
pub struct Poller<'a, W: Write> {
    source: &'a dyn StatusSource,
    decoder: Decoder,
    config: PollerConfig,
    notifier: Option<&'a dyn Notifier>,
    out: W,
}

impl<'a, W: Write> Poller<'a, W> {
    pub fn new(source: &'a dyn StatusSource, decoder: Decoder, config: PollerConfig, out: W) -> Self {
        Self {
            source,
            decoder,
            config,
            notifier: None,
            out,
        }
    }

    pub fn with_notifier(mut self, notifier: &'a dyn Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Run one cycle: fetch, compare, report.
    ///
    /// A retryable fetch failure leaves the state untouched and is not an
    /// error; fatal failures are returned.
    pub fn poll_once(
        &mut self,
        state: PollState,
        sleep: &mut dyn FnMut(Duration),
    ) -> Result<PollState> {
        let current = match fetch_snapshot(self.source, &self.decoder, &self.config.backoff, sleep) {
            Ok(snapshot) => snapshot,
            Err(err @ FetchError::Retryable { .. }) => {
                tracing::warn!(source = %self.source.describe(), "{err}; will try next cycle");
                return Ok(state);
            }
            Err(err) => return Err(err.into()),
        };

        let (state, event) = advance(state, current);

        match &event {
            PollEvent::Initial(snapshot) => {
                tracing::info!(detectors = snapshot.len(), "initial status captured");
                writeln!(self.out, "{}", format_report(snapshot, &BTreeSet::new()))?;
            }
            PollEvent::Unchanged(_) => {
                tracing::debug!("no detector status changes");
            }
            PollEvent::Changed { snapshot, changed } => {
                tracing::info!("{}", change_summary(changed));
                writeln!(self.out, "{}", format_report(snapshot, changed))?;
                if let Some(notifier) = self.notifier {
                    if let Err(e) = notifier.notify(snapshot, changed) {
                        tracing::warn!("notification failed: {e}");
                    }
                }
            }
        }
        self.out.flush()?;

        Ok(state)
    }

    /// Poll until `max_polls` is reached (or forever), sleeping between cycles.
    /// A limit of zero polls returns the state untouched.
    pub fn run(&mut self, mut state: PollState, sleep: &mut dyn FnMut(Duration)) -> Result<PollState> {
        if self.config.max_polls == Some(0) {
            return Ok(state);
        }

        let mut polls: u64 = 0;

        loop {
            state = self.poll_once(state, sleep)?;
            polls += 1;

            if self.config.max_polls.is_some_and(|max| polls >= max) {
                return Ok(state);
            }

            sleep(self.config.interval);
        }
    }
}
