use crate::logging::LogFormat;

/// Default log filter expression used by the binary.
///
/// Logs go to stderr and most callers only read stdout, so the default stays
/// quiet unless something goes wrong.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Default log filter expression used by the binary.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the binary.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}
