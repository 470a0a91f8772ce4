use gwstat::decode::{Decoder, PayloadFormat};
use gwstat::fetch::{BackoffPolicy, StatusSource};
use gwstat::models::constants::DEFAULT_DETECTORS;
use gwstat::notify::Notifier;
use gwstat::poller::{PollState, Poller, PollerConfig};
use gwstat::{FetchError, NotifyError, Snapshot, SourceError};
use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::time::Duration;

use super::fixture;

/// Replays a fixed list of responses, then fails fatally
struct ScriptedSource {
    responses: RefCell<VecDeque<Result<String, SourceError>>>,
}

impl ScriptedSource {
    fn new(responses: Vec<Result<String, SourceError>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
        }
    }

    fn remaining(&self) -> usize {
        self.responses.borrow().len()
    }
}

impl StatusSource for ScriptedSource {
    fn fetch_body(&self) -> Result<String, SourceError> {
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(SourceError::Fatal("no more responses".to_string())))
    }

    fn describe(&self) -> String {
        "scripted source".to_string()
    }
}

#[derive(Default)]
struct RecordingNotifier {
    calls: RefCell<Vec<BTreeSet<String>>>,
    fail: bool,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, _snapshot: &Snapshot, changed: &BTreeSet<String>) -> Result<(), NotifyError> {
        self.calls.borrow_mut().push(changed.clone());
        if self.fail {
            return Err(NotifyError::Rejected { status: 500 });
        }
        Ok(())
    }
}

fn decoder() -> Decoder {
    Decoder::new(
        PayloadFormat::Json,
        DEFAULT_DETECTORS.iter().map(|s| s.to_string()).collect(),
    )
}

fn config(max_polls: Option<u64>, backoff: BackoffPolicy) -> PollerConfig {
    PollerConfig {
        interval: Duration::from_secs(30),
        backoff,
        max_polls,
    }
}

fn ok(name: &str) -> Result<String, SourceError> {
    Ok(fixture(name))
}

fn transient() -> Result<String, SourceError> {
    Err(SourceError::Transient("HTTP 429 - Too Many Requests".to_string()))
}

#[test]
fn test_first_poll_prints_status_without_change() {
    let source = ScriptedSource::new(vec![ok("status.json")]);
    let notifier = RecordingNotifier::default();
    let mut out = Vec::new();

    let state = Poller::new(&source, decoder(), config(Some(1), BackoffPolicy::default()), &mut out)
        .with_notifier(&notifier)
        .run(PollState::default(), &mut |_| {})
        .unwrap();

    let printed = String::from_utf8(out).unwrap();
    assert_eq!(printed.matches("Status at").count(), 1);
    assert!(!printed.contains("<- changed"));
    assert!(notifier.calls.borrow().is_empty());
    assert_eq!(state.previous().unwrap().len(), 5);
}

#[test]
fn test_transient_error_then_change_is_reported_once() {
    let source = ScriptedSource::new(vec![
        ok("status.json"),
        transient(),
        ok("status.json"),
        ok("status_changed.json"),
    ]);
    let notifier = RecordingNotifier::default();
    let mut out = Vec::new();
    let mut slept = Vec::new();

    let state = Poller::new(&source, decoder(), config(Some(3), BackoffPolicy::default()), &mut out)
        .with_notifier(&notifier)
        .run(PollState::default(), &mut |d| slept.push(d))
        .unwrap();

    assert_eq!(source.remaining(), 0);
    assert_eq!(
        slept,
        vec![
            Duration::from_secs(30),
            Duration::from_secs(10),
            Duration::from_secs(30),
        ]
    );

    let printed = String::from_utf8(out).unwrap();
    assert_eq!(printed.matches("Status at").count(), 2);
    assert_eq!(printed.matches("<- changed").count(), 1);

    // KAGRA went to an error state: held at its last good value, not reported
    let calls = notifier.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["LIGO Livingston"]
    );

    let kagra = state.previous().unwrap().get("KAGRA").unwrap();
    assert_eq!(kagra.status, "Observing");
    assert!(kagra.error);
}

#[test]
fn test_exhausted_retries_keep_polling() {
    let backoff = BackoffPolicy {
        initial: Duration::from_secs(1),
        max: Duration::from_secs(4),
        max_attempts: 2,
    };
    let source = ScriptedSource::new(vec![
        ok("status.json"),
        transient(),
        transient(),
        ok("status_changed.json"),
    ]);
    let notifier = RecordingNotifier::default();
    let mut out = Vec::new();

    let result = Poller::new(&source, decoder(), config(Some(3), backoff), &mut out)
        .with_notifier(&notifier)
        .run(PollState::default(), &mut |_| {});

    assert!(result.is_ok());
    assert_eq!(notifier.calls.borrow().len(), 1);
}

#[test]
fn test_fatal_error_stops_the_loop() {
    let source = ScriptedSource::new(vec![
        ok("status.json"),
        Err(SourceError::Fatal("HTTP 404 - Not Found".to_string())),
        ok("status_changed.json"),
    ]);
    let mut out = Vec::new();

    let err = Poller::new(&source, decoder(), config(None, BackoffPolicy::default()), &mut out)
        .run(PollState::default(), &mut |_| {})
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<FetchError>(),
        Some(FetchError::Fatal(reason)) if reason.contains("404")
    ));
    assert_eq!(source.remaining(), 1);
}

#[test]
fn test_notifier_failure_does_not_stop_polling() {
    let source = ScriptedSource::new(vec![ok("status.json"), ok("status_changed.json")]);
    let notifier = RecordingNotifier {
        fail: true,
        ..Default::default()
    };
    let mut out = Vec::new();

    let result = Poller::new(&source, decoder(), config(Some(2), BackoffPolicy::default()), &mut out)
        .with_notifier(&notifier)
        .run(PollState::default(), &mut |_| {});

    assert!(result.is_ok());
    assert_eq!(notifier.calls.borrow().len(), 1);
}

#[test]
fn test_zero_poll_limit_never_fetches() {
    let source = ScriptedSource::new(vec![ok("status.json")]);
    let mut out = Vec::new();
    let mut sleeps = 0;

    let state = Poller::new(&source, decoder(), config(Some(0), BackoffPolicy::default()), &mut out)
        .run(PollState::default(), &mut |_| sleeps += 1)
        .unwrap();

    assert!(state.previous().is_none());
    assert_eq!(source.remaining(), 1);
    assert_eq!(sleeps, 0);
    assert!(out.is_empty());
}
