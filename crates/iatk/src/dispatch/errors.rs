//! Fatal dispatch failures.

use std::io;

use thiserror::Error;

/// Failures that prevent a response from reaching the caller.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request stream could not be read.
    #[error("failed to read request: {source}")]
    Read {
        /// I/O failure.
        #[source]
        source: io::Error,
    },
    /// Not even the internal-error response could be encoded.
    #[error("failed to encode response: {source}")]
    Encode {
        /// Encoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// The response could not be written.
    #[error("failed to write response: {source}")]
    Write {
        /// I/O failure.
        #[source]
        source: io::Error,
    },
}
