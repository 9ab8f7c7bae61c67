//! Trace retrieval.

use std::collections::BTreeMap;

use iatk_cloud::xray::{RawTrace, XRayApi};
use iatk_cloud::{ApiError, CallContext};
use serde::Serialize;
use thiserror::Error;

use crate::segment::{Segment, SegmentError};

const FETCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::fetch");

/// Errors raised while fetching traces.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The tracing service call failed.
    #[error("failed to get traces: {source}")]
    Call {
        /// Provider error.
        #[source]
        source: ApiError,
    },
    /// A returned segment could not be decoded.
    #[error("failed to load trace details for trace id: {trace_id}: {source}")]
    Decode {
        /// Trace carrying the segment.
        trace_id: String,
        /// Decoding failure.
        #[source]
        source: SegmentError,
    },
}

/// A trace with its decoded segments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    /// Trace id.
    pub id: String,
    /// Decoded segments.
    pub segments: Vec<Segment>,
}

impl Trace {
    /// Decodes every segment document of `raw`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Decode`] on the first malformed document.
    pub fn from_raw(raw: RawTrace) -> Result<Self, FetchError> {
        let segments = raw
            .segments
            .iter()
            .map(|segment| Segment::from_document(&segment.document))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| FetchError::Decode {
                trace_id: raw.id.clone(),
                source,
            })?;
        Ok(Self {
            id: raw.id,
            segments,
        })
    }
}

/// Fetches `trace_ids`, following pagination and asking again for ids the
/// service reports as unprocessed until none remain.
///
/// Ids the service never returns are absent from the result.
///
/// # Errors
///
/// Returns [`FetchError`] when a call fails or a segment cannot be decoded.
/// A cancelled or expired context surfaces as a call failure on the next
/// round.
pub fn fetch_traces(
    api: &dyn XRayApi,
    ctx: &CallContext,
    trace_ids: &[String],
) -> Result<BTreeMap<String, Trace>, FetchError> {
    let mut traces = BTreeMap::new();
    let mut pending = trace_ids.to_vec();
    while !pending.is_empty() {
        let mut unprocessed = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = api
                .batch_get_traces(ctx, &pending, token.as_deref())
                .map_err(|source| FetchError::Call { source })?;
            for raw in page.traces {
                if !traces.contains_key(&raw.id) {
                    let trace = Trace::from_raw(raw)?;
                    traces.insert(trace.id.clone(), trace);
                }
            }
            unprocessed.extend(page.unprocessed_trace_ids);
            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        if !unprocessed.is_empty() {
            tracing::debug!(
                target: FETCH_TARGET,
                pending = unprocessed.len(),
                "traces not processed yet, asking again"
            );
        }
        pending = unprocessed;
    }
    Ok(traces)
}
