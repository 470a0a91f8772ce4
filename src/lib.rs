pub mod commands;
pub mod config;
pub mod decode;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod models;
pub mod notify;
pub mod poller;
pub mod report;

pub use error::{ConfigError, FetchError, NotifyError, ParseError, SourceError};
pub use models::{derive_observing, diff, DetectorReading, Snapshot};
