//! Tracing subscriber initialisation.
//!
//! The embedding process calls [`init_tracing`] once at startup. `RUST_LOG`
//! takes precedence over the configured default level.

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The default filter directive could not be parsed.
    #[error("invalid log filter '{directive}': {source}")]
    Filter {
        /// Directive that failed to parse.
        directive: String,
        /// Parser error.
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    /// A global subscriber is already installed.
    #[error("tracing subscriber already initialised: {0}")]
    AlreadyInitialised(#[from] tracing_subscriber::util::TryInitError),
}

/// Builds the filter from `RUST_LOG`, falling back to `default_directive`.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when `RUST_LOG` is unset and
/// `default_directive` does not parse.
pub fn env_filter(default_directive: &str) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(default_directive).map_err(|source| TelemetryError::Filter {
        directive: default_directive.to_owned(),
        source,
    })
}

/// Installs a formatted tracing subscriber as the global default.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or a subscriber has
/// already been installed.
pub fn init_tracing(default_directive: &str) -> Result<(), TelemetryError> {
    let filter = env_filter(default_directive)?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()?;
    Ok(())
}
