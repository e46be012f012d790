//! Tracing subscriber setup for embedders and tests

use crate::config::TelemetryConfig;
use tracing_subscriber::EnvFilter;

/// Subscriber installation errors
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Filter directive did not parse
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    /// A global subscriber is already set
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

/// Install a global `fmt` subscriber
///
/// `RUST_LOG` wins over `config.filter` when set.
///
/// # Errors
/// Returns [`TelemetryError`] on a bad filter or if a subscriber exists
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.filter))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|err| TelemetryError::AlreadyInstalled(err.to_string()))
}
