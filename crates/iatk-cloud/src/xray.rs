//! X-Ray client contract.

use crate::context::CallContext;
use crate::error::ApiError;

/// Service name recorded on X-Ray errors.
pub const SERVICE: &str = "XRay";

/// Raw segment as stored by the tracing service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawSegment {
    /// Segment id.
    pub id: String,
    /// JSON document describing the segment.
    pub document: String,
}

/// Trace returned by `BatchGetTraces`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTrace {
    /// Trace id.
    pub id: String,
    /// Segments in service order.
    pub segments: Vec<RawSegment>,
}

/// One page of `BatchGetTraces`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TracePage {
    /// Traces returned on this page.
    pub traces: Vec<RawTrace>,
    /// Requested ids the service has not processed yet.
    pub unprocessed_trace_ids: Vec<String>,
    /// Token for the next page, absent on the last page.
    pub next_token: Option<String>,
}

/// Operations used against X-Ray.
pub trait XRayApi: Send + Sync {
    /// Fetches one page of the requested traces.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the call fails.
    fn batch_get_traces(
        &self,
        ctx: &CallContext,
        trace_ids: &[String],
        next_token: Option<&str>,
    ) -> Result<TracePage, ApiError>;
}
