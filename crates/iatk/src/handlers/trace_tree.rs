//! Trace tree retrieval.

use iatk_xray::{build_tree, trace_id_from_header};
use serde::Deserialize;
use serde_json::Value;

use super::{HandlerContext, MethodError, output, require};

/// Parameters of `get_trace_tree`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields, default)]
pub struct GetTraceTreeParams {
    /// Tracing header carrying `Root=<trace id>`.
    pub tracing_header: String,
    /// Whether to graft traces linked as children into the tree.
    pub fetch_child_traces: bool,
    /// Region override.
    pub region: Option<String>,
    /// Profile override.
    pub profile: Option<String>,
}

/// Builds the trace tree for the trace named by a tracing header.
///
/// # Errors
///
/// Returns [`MethodError`] for a blank or malformed header, or when the
/// trace cannot be fetched or arranged.
pub fn get_trace_tree(
    params: GetTraceTreeParams,
    ctx: &HandlerContext<'_>,
) -> Result<Value, MethodError> {
    require(&params.tracing_header, "TracingHeader")?;
    let trace_id = trace_id_from_header(&params.tracing_header)
        .map_err(|source| MethodError::TracingHeader { source })?;
    let clients = ctx.clients(params.region.as_deref(), params.profile.as_deref())?;
    let tree = build_tree(
        clients.xray.as_ref(),
        ctx.call(),
        &trace_id,
        params.fetch_child_traces,
    )
    .map_err(|source| MethodError::TraceTree {
        source: Box::new(source),
    })?;
    output(&tree)
}
