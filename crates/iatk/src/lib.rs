//! JSON-RPC front end of the integrated application test kit.
//!
//! One invocation reads one JSON-RPC request from stdin, routes it through
//! the method [`registry`], runs the matching handler against the cloud
//! clients built by a [`CloudProvider`](iatk_cloud::CloudProvider), and
//! writes exactly one response line to stdout. Diagnostics go to stderr
//! through [`telemetry`].

mod dispatch;
pub mod handlers;
pub mod jsonrpc;
pub mod registry;
pub mod telemetry;

pub use dispatch::{DispatchError, dispatch, run_with_provider};
pub use handlers::{HandlerContext, MethodError};
pub use registry::{MethodCall, MethodEntry, lookup};

#[cfg(test)]
mod tests;
