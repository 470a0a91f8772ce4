use serde::Serialize;

use super::constants::{ERROR_MARKER, OBSERVING_STATUSES};

/// One detector's status as seen in a single poll.
///
/// `status` is the effective status. When the upstream reports an error and a
/// last-known-good value exists, `status` and `observing` are carried over from
/// the previous poll and the upstream text is kept in `upstream_error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectorReading {
    pub status: String,
    pub observing: bool,
    pub error: bool,
    pub color: Option<String>,
    pub upstream_error: Option<String>,
}

impl DetectorReading {
    /// Build a reading from a raw upstream status string
    pub fn new(status: impl Into<String>) -> Self {
        let status = status.into().trim().to_string();
        Self {
            observing: derive_observing(&status),
            error: is_error_status(&status),
            status,
            color: None,
            upstream_error: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        let color = color.into();
        if !color.trim().is_empty() {
            self.color = Some(color.trim().to_string());
        }
        self
    }

    /// Whether the effective status was carried over from an earlier poll
    pub fn is_held(&self) -> bool {
        self.upstream_error.is_some()
    }

    /// Replace an error reading with the last-known-good values of `previous`.
    ///
    /// If `previous` never had a good value the reading is returned unchanged.
    pub fn hold_from(self, previous: &DetectorReading) -> DetectorReading {
        if !self.error || is_error_status(&previous.status) {
            return self;
        }

        DetectorReading {
            status: previous.status.clone(),
            observing: previous.observing,
            error: true,
            color: previous.color.clone(),
            upstream_error: Some(self.status),
        }
    }
}

/// True iff `status` is one of the "good" observing values.
pub fn derive_observing(status: &str) -> bool {
    OBSERVING_STATUSES.contains(&status)
}

/// True if `status` carries the error marker, ignoring case.
pub fn is_error_status(status: &str) -> bool {
    status.to_lowercase().contains(ERROR_MARKER)
}
