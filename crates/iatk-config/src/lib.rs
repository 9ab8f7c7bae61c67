//! Shared configuration for the `iatk` binary.
//!
//! Configuration is deliberately small: the JSON-RPC request carries region
//! and profile per call, so the process only needs to know how to log and
//! which region/profile to fall back to when a request leaves them blank.
//! Values come from command-line flags with environment fallbacks.

mod defaults;
mod logging;

use std::ffi::OsString;

use clap::Parser;

pub use defaults::{DEFAULT_LOG_FILTER, default_log_filter, default_log_format};
pub use logging::{LogFormat, LogFormatParseError};

/// Process-level configuration resolved from flags and environment.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "iatk",
    about = "Reads one JSON-RPC request from stdin and writes one response to stdout.",
    version
)]
pub struct Config {
    /// Tracing filter expression (for example `info` or `iatk_harness=debug`).
    #[arg(long, env = "IATK_LOG_FILTER", default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,

    /// Log output format written to stderr.
    #[arg(long, env = "IATK_LOG_FORMAT", default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// Region used when a request does not name one.
    #[arg(long, env = "AWS_REGION")]
    pub default_region: Option<String>,

    /// Credential profile used when a request does not name one.
    #[arg(long, env = "AWS_PROFILE")]
    pub default_profile: Option<String>,

    /// Print the method specification table as JSON and exit.
    #[arg(long)]
    pub rpc_specs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            log_format: default_log_format(),
            default_region: None,
            default_profile: None,
            rpc_specs: false,
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns the `clap` error when the arguments cannot be parsed.
    pub fn load() -> Result<Self, clap::Error> {
        Self::try_parse()
    }

    /// Loads configuration from an explicit argument list.
    ///
    /// The first item is treated as the binary name, mirroring
    /// [`std::env::args_os`].
    ///
    /// # Errors
    ///
    /// Returns the `clap` error when the arguments cannot be parsed.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args)
    }

    /// Returns the configured tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Picks the request region, falling back to the configured default.
    ///
    /// Blank request values count as absent.
    #[must_use]
    pub fn region_or_default(&self, requested: Option<&str>) -> Option<String> {
        non_blank(requested).or_else(|| non_blank(self.default_region.as_deref()))
    }

    /// Picks the request profile, falling back to the configured default.
    #[must_use]
    pub fn profile_or_default(&self, requested: Option<&str>) -> Option<String> {
        non_blank(requested).or_else(|| non_blank(self.default_profile.as_deref()))
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
}
