//! JSON-RPC 2.0 envelope used on stdin and stdout.
//!
//! Requests are decoded strictly: unknown envelope fields, a missing method
//! or a version tag other than `2.0` make the whole request unparsable.
//! Responses always echo the request id and carry exactly one of `result` or
//! `error`.

mod metadata;
mod request;
mod response;

pub use metadata::{Metadata, UNKNOWN_USER_AGENT, USER_AGENT_KEY};
pub use request::{JSONRPC_VERSION, Request, RequestError};
pub use response::{APPLICATION_ERROR_CODE, ErrorCode, Outcome, Response, RpcError};
