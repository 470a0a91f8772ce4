pub mod constants;
pub mod detector;
pub mod snapshot;

pub use detector::{derive_observing, is_error_status, DetectorReading};
pub use snapshot::{diff, Snapshot};
