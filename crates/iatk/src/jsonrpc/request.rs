//! Request envelope decoding.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use super::metadata::Metadata;

/// Protocol version accepted and emitted.
pub const JSONRPC_VERSION: &str = "2.0";

/// Errors raised while decoding a request envelope.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The input was empty after trimming whitespace.
    #[error("empty request")]
    Empty,
    /// The input is not a JSON object matching the envelope.
    #[error("malformed request: {source}")]
    Malformed {
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// The version tag is not `2.0`.
    #[error("unsupported jsonrpc version \"{version}\"")]
    Version {
        /// Version found in the request.
        version: String,
    },
}

/// One JSON-RPC request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Request {
    /// Protocol version tag.
    pub jsonrpc: String,
    /// Request id, echoed verbatim in the response.
    #[serde(default)]
    pub id: Option<String>,
    /// Method name.
    pub method: String,
    /// Method parameters, decoded later against the method's own type.
    /// `None` when the member is absent; an explicit `null` is kept as
    /// `Some(Value::Null)`.
    #[serde(default, deserialize_with = "present")]
    pub params: Option<Value>,
    /// Information about the calling client.
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl Request {
    /// Parses a request from raw stdin bytes.
    ///
    /// Surrounding whitespace (including a trailing newline) is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] when the input is empty, is not a valid
    /// envelope, or names another protocol version.
    pub fn parse(input: &[u8]) -> Result<Self, RequestError> {
        let trimmed = input.trim_ascii();
        if trimmed.is_empty() {
            return Err(RequestError::Empty);
        }
        let request: Self =
            serde_json::from_slice(trimmed).map_err(|source| RequestError::Malformed { source })?;
        if request.jsonrpc != JSONRPC_VERSION {
            return Err(RequestError::Version {
                version: request.jsonrpc,
            });
        }
        Ok(request)
    }
}
