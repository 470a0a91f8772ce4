//! Per-poll detector snapshots and the change detection between them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::detector::{is_error_status, DetectorReading};

/// One poll's statuses for the tracked detectors, plus when it was captured.
///
/// A snapshot only ever holds detectors from the allow-list it was built with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub captured_at: DateTime<Utc>,
    readings: BTreeMap<String, DetectorReading>,
}

impl Snapshot {
    /// Build a snapshot, dropping any reading whose detector is not allow-listed
    pub fn from_readings<I>(captured_at: DateTime<Utc>, allow_list: &[String], readings: I) -> Self
    where
        I: IntoIterator<Item = (String, DetectorReading)>,
    {
        let readings = readings
            .into_iter()
            .filter(|(name, _)| allow_list.iter().any(|allowed| allowed == name))
            .collect();

        Self {
            captured_at,
            readings,
        }
    }

    pub fn get(&self, detector: &str) -> Option<&DetectorReading> {
        self.readings.get(detector)
    }

    /// Readings in detector-name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DetectorReading)> {
        self.readings.iter().map(|(name, reading)| (name.as_str(), reading))
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Length in characters of the longest detector name
    pub fn longest_name(&self) -> usize {
        self.readings
            .keys()
            .map(|name| name.chars().count())
            .max()
            .unwrap_or(0)
    }

    /// Apply the hold-last-known-good policy against the previous poll.
    ///
    /// Every detector now reporting an error takes its status and observing
    /// flag from `previous`, if `previous` had a good value for it.
    pub fn reconcile(self, previous: Option<&Snapshot>) -> Snapshot {
        let Some(previous) = previous else {
            return self;
        };

        let readings = self
            .readings
            .into_iter()
            .map(|(name, reading)| {
                let reading = match previous.get(&name) {
                    Some(prior) => reading.hold_from(prior),
                    None => reading,
                };
                (name, reading)
            })
            .collect();

        Snapshot {
            captured_at: self.captured_at,
            readings,
        }
    }
}

/// Names of the detectors whose status string changed between two snapshots.
///
/// A detector is left out when it reports an error now, or when the previous
/// snapshot had no good status for it to compare against.
pub fn diff(previous: &Snapshot, current: &Snapshot) -> BTreeSet<String> {
    current
        .iter()
        .filter_map(|(name, now)| {
            let before = previous.get(name)?;
            if now.error || is_error_status(&before.status) {
                return None;
            }
            (now.status != before.status).then(|| name.to_string())
        })
        .collect()
}
