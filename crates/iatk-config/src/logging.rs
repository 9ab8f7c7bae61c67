//! Log line format for the stderr sink.
//!
//! Test runners usually replay a failed subprocess's stderr as-is, so the
//! default is one compact line per event. `json` suits runners that forward
//! stderr to a log store.

use strum::{Display, EnumString, VariantNames};

/// Shape of each line written to stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, Display, VariantNames)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One human-readable line per event.
    #[default]
    Compact,
    /// One JSON object per event, fields flattened.
    Json,
}

impl LogFormat {
    /// Whether colour escapes may be written when stderr is a terminal.
    /// JSON lines never carry them.
    #[must_use]
    pub const fn allows_ansi(self) -> bool {
        matches!(self, Self::Compact)
    }
}

/// Error returned when text names no [`LogFormat`].
pub type LogFormatParseError = strum::ParseError;
