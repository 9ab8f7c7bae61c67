//! Distributed-trace reconstruction.
//!
//! Segments fetched from the tracing service arrive as a flat list of JSON
//! documents. This crate decodes them, orders them by start time, links each
//! segment under its parent and enumerates every root-to-leaf path. Child
//! traces linked from a segment can optionally be fetched and grafted onto
//! the tree.

pub mod fetch;
pub mod header;
pub mod segment;
pub mod tree;

pub use fetch::{FetchError, Trace, fetch_traces};
pub use header::{HeaderError, trace_id_from_header};
pub use segment::{Link, Segment, SegmentError, Subsegment};
pub use tree::{MAX_LINK_DEPTH, TraceTree, TreeError, build_tree};

#[cfg(test)]
mod tests;
