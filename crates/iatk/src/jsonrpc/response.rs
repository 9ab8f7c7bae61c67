//! Response envelope encoding.

use serde::Serialize;
use serde_json::Value;

use super::request::JSONRPC_VERSION;

/// Code carried by errors raised by a method handler.
pub const APPLICATION_ERROR_CODE: i32 = 10;

/// Protocol-level failures with fixed codes and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The request envelope could not be decoded.
    ParseError,
    /// No method is registered under the requested name.
    MethodNotFound,
    /// The parameters do not decode into the method's parameter type.
    InvalidParams,
    /// The response could not be produced.
    InternalError,
}

impl ErrorCode {
    /// Numeric code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
        }
    }

    /// Fixed message.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
        }
    }
}

/// Error member of a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcError {
    /// Numeric code.
    pub code: i32,
    /// Human-readable message.
    pub message: String,
}

impl RpcError {
    /// Creates a protocol-level error.
    #[must_use]
    pub fn protocol(code: ErrorCode) -> Self {
        Self {
            code: code.code(),
            message: code.message().to_owned(),
        }
    }

    /// Creates an application error carrying a handler message.
    #[must_use]
    pub fn application(message: impl Into<String>) -> Self {
        Self {
            code: APPLICATION_ERROR_CODE,
            message: message.into(),
        }
    }
}

/// Exactly one of `result` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Successful call; the handler value sits under `output`.
    Result {
        /// Handler value.
        output: Value,
    },
    /// Failed call.
    Error(RpcError),
}

/// One JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// Protocol version tag.
    pub jsonrpc: &'static str,
    /// Id echoed from the request; `null` when the request was unparsable.
    pub id: Option<String>,
    /// Result or error member.
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Response {
    /// Creates a successful response.
    #[must_use]
    pub const fn success(id: Option<String>, output: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            outcome: Outcome::Result { output },
        }
    }

    /// Creates an error response.
    #[must_use]
    pub const fn error(id: Option<String>, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            outcome: Outcome::Error(error),
        }
    }

    /// Creates a protocol-level error response.
    #[must_use]
    pub fn protocol_error(id: Option<String>, code: ErrorCode) -> Self {
        Self::error(id, RpcError::protocol(code))
    }

    /// Returns the error member, if any.
    #[must_use]
    pub const fn rpc_error(&self) -> Option<&RpcError> {
        match &self.outcome {
            Outcome::Error(error) => Some(error),
            Outcome::Result { .. } => None,
        }
    }

    /// Encodes the response as one line of JSON without the trailing newline.
    ///
    /// # Errors
    ///
    /// Returns the encoder error when the result value cannot be serialised.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn encoded(response: &Response) -> String {
        String::from_utf8(response.encode().expect("encode")).expect("utf-8")
    }

    #[rstest]
    fn parse_error_matches_wire_format() {
        let response = Response::protocol_error(None, ErrorCode::ParseError);
        assert_eq!(
            encoded(&response),
            r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"Parse error"}}"#
        );
    }

    #[rstest]
    fn success_wraps_output() {
        let response = Response::success(Some("42".to_owned()), json!(["a", "b"]));
        assert_eq!(
            encoded(&response),
            r#"{"jsonrpc":"2.0","id":"42","result":{"output":["a","b"]}}"#
        );
        assert!(response.rpc_error().is_none());
    }

    #[rstest]
    #[case(ErrorCode::MethodNotFound, -32601, "Method not found")]
    #[case(ErrorCode::InvalidParams, -32602, "Invalid params")]
    #[case(ErrorCode::InternalError, -32603, "Internal error")]
    fn protocol_codes_are_fixed(#[case] code: ErrorCode, #[case] number: i32, #[case] message: &str) {
        let error = RpcError::protocol(code);
        assert_eq!(error.code, number);
        assert_eq!(error.message, message);
    }

    #[rstest]
    fn application_errors_use_code_ten() {
        let response = Response::error(Some("1".to_owned()), RpcError::application("boom"));
        assert_eq!(
            encoded(&response),
            r#"{"jsonrpc":"2.0","id":"1","error":{"code":10,"message":"boom"}}"#
        );
    }
}
