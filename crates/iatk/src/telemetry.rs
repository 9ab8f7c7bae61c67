//! Stderr telemetry for a single request.
//!
//! Stdout carries exactly one response line, so every event is written to
//! stderr. The process serves one request and exits: the subscriber is
//! installed once from [`Config`] and never reconfigured.

use std::io::{self, IsTerminal};

use iatk_config::{Config, LogFormat};
use once_cell::sync::OnceCell;
use tracing::Subscriber;
use tracing_subscriber::fmt::{self, time::UtcTime};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer};

static INSTALLED: OnceCell<LogFormat> = OnceCell::new();

/// Errors encountered while installing telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter expression does not parse.
    #[error("invalid log filter \"{filter}\": {message}")]
    Filter {
        /// Expression as configured.
        filter: String,
        /// Parser message.
        message: String,
    },
    /// Another global subscriber is already installed.
    #[error("failed to install telemetry subscriber: {source}")]
    Install {
        /// Installation failure.
        #[source]
        source: TryInitError,
    },
}

/// Installs the stderr subscriber described by `config` and returns the line
/// format in effect.
///
/// Only the first call installs anything; later calls return the format
/// chosen then, whatever `config` says.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter does not parse or a subscriber
/// was installed by someone else.
///
/// # Examples
///
/// ```rust
/// use iatk::telemetry;
/// use iatk_config::{Config, LogFormat};
///
/// # fn main() -> Result<(), iatk::telemetry::TelemetryError> {
/// let format = telemetry::initialise(&Config::default())?;
/// assert_eq!(format, LogFormat::Compact);
/// # Ok(())
/// # }
/// ```
pub fn initialise(config: &Config) -> Result<LogFormat, TelemetryError> {
    INSTALLED.get_or_try_init(|| install(config)).copied()
}

fn install(config: &Config) -> Result<LogFormat, TelemetryError> {
    let filter = parse_filter(config.log_filter())?;
    let format = config.log_format();
    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer(format, io::stderr().is_terminal()))
        .try_init()
        .map_err(|source| TelemetryError::Install { source })?;
    Ok(format)
}

fn parse_filter(expression: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(expression).map_err(|error| TelemetryError::Filter {
        filter: expression.to_owned(),
        message: error.to_string(),
    })
}

fn stderr_layer<S>(format: LogFormat, terminal: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_timer(UtcTime::rfc_3339())
        .with_target(true)
        .with_ansi(terminal && format.allows_ansi());
    match format {
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Json => layer.json().flatten_event(true).boxed(),
    }
}
