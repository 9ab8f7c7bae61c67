//! Single-request dispatch.
//!
//! [`dispatch`] turns raw request bytes into exactly one [`Response`]: parse
//! failures, unknown methods and undecodable params become protocol errors,
//! handler failures become application errors. [`run_with_provider`] wraps
//! it with the stdin/stdout plumbing used by the binary.

mod errors;

use std::io::{Read, Write};

use iatk_cloud::CloudProvider;
use iatk_config::Config;

pub use errors::DispatchError;

use crate::handlers::HandlerContext;
use crate::jsonrpc::{ErrorCode, Request, Response, RpcError};
use crate::registry::lookup;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Produces the response for one request.
#[must_use]
pub fn dispatch(input: &[u8], provider: &dyn CloudProvider, config: &Config) -> Response {
    let request = match Request::parse(input) {
        Ok(request) => request,
        Err(error) => {
            tracing::warn!(target: DISPATCH_TARGET, %error, "rejecting unparsable request");
            return Response::protocol_error(None, ErrorCode::ParseError);
        }
    };
    let Request {
        id,
        method,
        params,
        metadata,
        ..
    } = request;

    let Some(entry) = lookup(&method) else {
        tracing::warn!(target: DISPATCH_TARGET, method = %method, "method not found");
        return Response::protocol_error(id, ErrorCode::MethodNotFound);
    };
    let Some(params) = params else {
        tracing::warn!(target: DISPATCH_TARGET, method = %method, "request has no params");
        return Response::protocol_error(id, ErrorCode::InvalidParams);
    };
    let call = match (entry.decode)(params) {
        Ok(call) => call,
        Err(error) => {
            tracing::warn!(target: DISPATCH_TARGET, method = %method, %error, "invalid params");
            return Response::protocol_error(id, ErrorCode::InvalidParams);
        }
    };

    if let Some(dedup_key) = metadata
        .as_ref()
        .map(|meta| meta.dedup_key.as_str())
        .filter(|key| !key.is_empty())
    {
        tracing::debug!(target: DISPATCH_TARGET, dedup_key, "request carries a dedup key");
    }
    let ctx = HandlerContext::new(provider, config, metadata.as_ref());
    tracing::debug!(
        target: DISPATCH_TARGET,
        method = %method,
        user_agent = ctx.user_agent(),
        "dispatching request"
    );
    match call.handle(&ctx) {
        Ok(output) => Response::success(id, output),
        Err(error) if error.is_internal() => {
            tracing::error!(target: DISPATCH_TARGET, method = %method, %error, "handler output unusable");
            Response::protocol_error(id, ErrorCode::InternalError)
        }
        Err(error) => {
            tracing::info!(target: DISPATCH_TARGET, method = %method, %error, "method failed");
            Response::error(id, RpcError::application(error.to_string()))
        }
    }
}

/// Reads one request from `input`, dispatches it and writes one response
/// line to `output`.
///
/// # Errors
///
/// Returns [`DispatchError`] when the request cannot be read or no response
/// can be written. Request-level failures are reported in the response and
/// are not errors here.
pub fn run_with_provider<R, W>(
    mut input: R,
    mut output: W,
    provider: &dyn CloudProvider,
    config: &Config,
) -> Result<(), DispatchError>
where
    R: Read,
    W: Write,
{
    let mut request = Vec::new();
    input
        .read_to_end(&mut request)
        .map_err(|source| DispatchError::Read { source })?;

    let response = dispatch(&request, provider, config);
    let encoded = match response.encode() {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!(target: DISPATCH_TARGET, %error, "failed to encode response");
            Response::protocol_error(response.id, ErrorCode::InternalError)
                .encode()
                .map_err(|source| DispatchError::Encode { source })?
        }
    };

    output
        .write_all(&encoded)
        .and_then(|()| output.write_all(b"\n"))
        .and_then(|()| output.flush())
        .map_err(|source| DispatchError::Write { source })
}
