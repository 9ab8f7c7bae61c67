//! Trace tree construction.
//!
//! Segments are sorted by start time so the root comes first and every
//! other segment follows its parent. Each segment is then placed under the
//! node owning its parent id, found by a pre-order search from the root. A
//! parent id may name a segment or any of its subsegments.
//!
//! When linked traces are requested, child links recorded on the inserted
//! segments are fetched in one batch per level, built the same way and
//! grafted under the linking segment, up to [`MAX_LINK_DEPTH`] levels.

use std::collections::BTreeMap;

use iatk_cloud::CallContext;
use iatk_cloud::xray::XRayApi;
use serde::Serialize;
use thiserror::Error;

use crate::fetch::{FetchError, Trace, fetch_traces};
use crate::segment::Segment;

const TREE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::tree");

/// Deepest level of linked traces that is fetched.
pub const MAX_LINK_DEPTH: usize = 5;

/// Errors raised while building a trace tree.
#[derive(Debug, Error)]
pub enum TreeError {
    /// The source trace could not be fetched.
    #[error("failed to fetch trace {trace_id} with error: {source}")]
    Fetch {
        /// Requested trace.
        trace_id: String,
        /// Fetch failure.
        #[source]
        source: FetchError,
    },
    /// The service did not return the source trace.
    #[error("failed to fetch trace {trace_id} with error: trace not found")]
    NotFound {
        /// Requested trace.
        trace_id: String,
    },
    /// The source trace holds no segments.
    #[error("failed to fetch trace {trace_id} with error: no trace segments found")]
    NoSegments {
        /// Requested trace.
        trace_id: String,
    },
    /// A segment names a parent absent from the tree.
    #[error("failed to build trace tree {trace_id} with error: found a segment {segment_id} with no parent")]
    Orphan {
        /// Trace being built.
        trace_id: String,
        /// Offending segment.
        segment_id: String,
    },
    /// Linked traces could not be fetched.
    #[error("failed to fetch linked traces {trace_ids:?} with error: {source}")]
    LinkedFetch {
        /// Linked trace ids requested.
        trace_ids: Vec<String>,
        /// Fetch failure.
        #[source]
        source: FetchError,
    },
}

/// A trace arranged as a parent/child tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceTree {
    /// Segment without a parent in the source trace.
    pub root: Segment,
    /// Every root-to-leaf path, in pre-order.
    pub paths: Vec<Vec<Segment>>,
    /// The trace the tree was built from, segments sorted by start time.
    pub source_trace: Trace,
    /// Whether linked traces remained beyond the depth limit. Present only
    /// when linked traces were requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_trace_limit_exceeded: Option<bool>,
}

impl TraceTree {
    /// Builds the tree of an already fetched trace without following links.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NoSegments`] for an empty trace and
    /// [`TreeError::Orphan`] when a parent id matches no earlier segment.
    pub fn from_trace(trace: Trace) -> Result<Self, TreeError> {
        Self::assemble(trace, None)
    }

    fn assemble(mut trace: Trace, linked: Option<Linked<'_>>) -> Result<Self, TreeError> {
        sort_by_start(&mut trace.segments);
        let Some(root_segment) = trace.segments.first().cloned() else {
            return Err(TreeError::NoSegments { trace_id: trace.id });
        };
        let follows_links = linked.is_some();
        let mut builder = Builder {
            arena: Arena::default(),
            linked,
            limit_exceeded: false,
        };
        let Some(root) = builder.insert(&trace.id, trace.segments.clone(), 0)? else {
            return Err(TreeError::NoSegments { trace_id: trace.id });
        };
        Ok(Self {
            root: root_segment,
            paths: builder.arena.leaf_paths(root),
            source_trace: trace,
            linked_trace_limit_exceeded: follows_links.then_some(builder.limit_exceeded),
        })
    }
}

/// Fetches `trace_id` and builds its tree, optionally grafting linked child
/// traces under the segments that started them.
///
/// # Errors
///
/// Returns [`TreeError`] when the trace cannot be fetched, is empty or is
/// malformed, or when linked traces cannot be fetched.
pub fn build_tree(
    api: &dyn XRayApi,
    ctx: &CallContext,
    trace_id: &str,
    fetch_linked_traces: bool,
) -> Result<TraceTree, TreeError> {
    let ids = [trace_id.to_owned()];
    let mut fetched = fetch_traces(api, ctx, &ids).map_err(|source| TreeError::Fetch {
        trace_id: trace_id.to_owned(),
        source,
    })?;
    let Some(trace) = fetched.remove(trace_id) else {
        return Err(TreeError::NotFound {
            trace_id: trace_id.to_owned(),
        });
    };
    tracing::debug!(
        target: TREE_TARGET,
        trace = trace_id,
        segments = trace.segments.len(),
        linked = fetch_linked_traces,
        "building trace tree"
    );
    let linked = fetch_linked_traces.then_some(Linked { api, ctx });
    TraceTree::assemble(trace, linked)
}

fn sort_by_start(segments: &mut [Segment]) {
    segments.sort_by(|left, right| left.start_time.total_cmp(&right.start_time));
}

#[derive(Clone, Copy)]
struct Linked<'a> {
    api: &'a dyn XRayApi,
    ctx: &'a CallContext,
}

struct Node {
    segment: Segment,
    children: Vec<usize>,
}

#[derive(Default)]
struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    fn push(&mut self, segment: Segment) -> usize {
        self.nodes.push(Node {
            segment,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    fn attach(&mut self, parent: usize, child: usize) {
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
    }

    fn segment(&self, node: usize) -> Option<&Segment> {
        self.nodes.get(node).map(|entry| &entry.segment)
    }

    fn find_owner(&self, node: usize, id: &str) -> Option<usize> {
        let current = self.nodes.get(node)?;
        if current.segment.owns_id(id) {
            return Some(node);
        }
        current
            .children
            .iter()
            .find_map(|&child| self.find_owner(child, id))
    }

    fn leaf_paths(&self, root: usize) -> Vec<Vec<Segment>> {
        let mut paths = Vec::new();
        self.walk(root, &mut Vec::new(), &mut paths);
        paths
    }

    fn walk(&self, node: usize, path: &mut Vec<usize>, paths: &mut Vec<Vec<Segment>>) {
        let Some(current) = self.nodes.get(node) else {
            return;
        };
        path.push(node);
        if current.children.is_empty() {
            paths.push(
                path.iter()
                    .filter_map(|&index| self.segment(index).cloned())
                    .collect(),
            );
        } else {
            for &child in &current.children {
                self.walk(child, path, paths);
            }
        }
        path.pop();
    }
}

struct Builder<'a> {
    arena: Arena,
    linked: Option<Linked<'a>>,
    limit_exceeded: bool,
}

impl Builder<'_> {
    /// Inserts one trace and returns its root node, or `None` when it has no
    /// segments.
    fn insert(
        &mut self,
        trace_id: &str,
        mut segments: Vec<Segment>,
        depth: usize,
    ) -> Result<Option<usize>, TreeError> {
        sort_by_start(&mut segments);
        let mut ordered = segments.into_iter();
        let Some(first) = ordered.next() else {
            return Ok(None);
        };
        let root = self.arena.push(first);
        let mut links = BTreeMap::new();
        self.note_links(root, &mut links);
        for segment in ordered {
            let Some(parent_id) = segment.parent_id.as_deref() else {
                tracing::debug!(
                    target: TREE_TARGET,
                    trace = trace_id,
                    segment = %segment.id,
                    "skipping second segment without parent"
                );
                continue;
            };
            let Some(parent) = self.arena.find_owner(root, parent_id) else {
                return Err(TreeError::Orphan {
                    trace_id: trace_id.to_owned(),
                    segment_id: segment.id,
                });
            };
            let node = self.arena.push(segment);
            self.arena.attach(parent, node);
            self.note_links(node, &mut links);
        }
        if !links.is_empty() {
            self.expand(&links, depth)?;
        }
        Ok(Some(root))
    }

    fn note_links(&self, node: usize, links: &mut BTreeMap<String, usize>) {
        if self.linked.is_none() {
            return;
        }
        let Some(segment) = self.arena.segment(node) else {
            return;
        };
        for trace_id in segment.child_trace_ids() {
            links.entry(trace_id).or_insert(node);
        }
    }

    fn expand(&mut self, links: &BTreeMap<String, usize>, depth: usize) -> Result<(), TreeError> {
        let Some(linked) = self.linked else {
            return Ok(());
        };
        if depth >= MAX_LINK_DEPTH {
            self.limit_exceeded = true;
            return Ok(());
        }
        let ids: Vec<String> = links.keys().cloned().collect();
        let fetched = fetch_traces(linked.api, linked.ctx, &ids).map_err(|source| {
            TreeError::LinkedFetch {
                trace_ids: ids.clone(),
                source,
            }
        })?;
        for (trace_id, trace) in fetched {
            let Some(&parent) = links.get(&trace_id) else {
                continue;
            };
            match self.insert(&trace_id, trace.segments, depth + 1)? {
                Some(root) => self.arena.attach(parent, root),
                None => tracing::debug!(
                    target: TREE_TARGET,
                    trace = %trace_id,
                    "linked trace has no segments"
                ),
            }
        }
        Ok(())
    }
}
