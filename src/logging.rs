//! Diagnostic logging to stderr.
//!
//! Reports go to stdout; everything here goes to stderr so the two can be
//! redirected separately.

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// The level defaults to `info` (`debug` with `verbose`); `RUST_LOG` overrides both.
pub fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let init_result = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();

    if let Err(e) = init_result {
        // Another subscriber (e.g. from a test harness) is already installed.
        if !e.to_string().contains("already") {
            return Err(e.into());
        }
    }

    Ok(())
}
