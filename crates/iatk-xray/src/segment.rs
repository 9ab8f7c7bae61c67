//! Segment documents.
//!
//! Only the fields the tree builder relies on are typed. Everything else in
//! a document is kept verbatim so it survives into the output unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Reference type marking a link to a trace started by this segment.
pub const CHILD_REFERENCE: &str = "child";

/// Failure to decode a segment document.
#[derive(Debug, Error)]
pub enum SegmentError {
    /// The document is not a valid segment.
    #[error("failed to decode segment document: {source}")]
    Decode {
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
}

/// One segment of a trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment id, unique within its trace.
    pub id: String,
    /// Logical name of the recording service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Trace the segment belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Epoch seconds at which the segment started.
    #[serde(default)]
    pub start_time: f64,
    /// Segment or subsegment id of the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Resource type that recorded the segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Links to related traces.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    /// Nested work recorded inside the segment.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsegments: Vec<Subsegment>,
    /// Remaining document fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Nested unit of work inside a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subsegment {
    /// Subsegment id.
    pub id: String,
    /// Links to related traces.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    /// Further nested subsegments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsegments: Vec<Self>,
    /// Remaining document fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Link from a segment to another trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Linked trace id.
    pub trace_id: String,
    /// Linked segment id, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Link attributes.
    #[serde(default)]
    pub attributes: LinkAttributes,
}

/// Attributes attached to a [`Link`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkAttributes {
    /// Relationship between the linking segment and the linked trace.
    #[serde(
        default,
        rename = "aws.xray.reserved.reference_type",
        alias = "reference_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub reference_type: Option<String>,
    /// Remaining attributes.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Link {
    /// Reports whether the link points at a trace this segment started.
    #[must_use]
    pub fn is_child(&self) -> bool {
        self.attributes.reference_type.as_deref() == Some(CHILD_REFERENCE)
    }
}

impl Segment {
    /// Decodes a segment from its JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::Decode`] when `document` is not a segment.
    pub fn from_document(document: &str) -> Result<Self, SegmentError> {
        serde_json::from_str(document).map_err(|source| SegmentError::Decode { source })
    }

    /// Reports whether `id` names this segment or one of its subsegments at
    /// any depth.
    #[must_use]
    pub fn owns_id(&self, id: &str) -> bool {
        self.id == id || self.subsegments.iter().any(|sub| sub.owns_id(id))
    }

    /// Trace ids linked as children from this segment or its subsegments.
    #[must_use]
    pub fn child_trace_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .links
            .iter()
            .filter(|link| link.is_child())
            .map(|link| link.trace_id.clone())
            .collect();
        for sub in &self.subsegments {
            sub.collect_child_trace_ids(&mut ids);
        }
        ids
    }
}

impl Subsegment {
    fn owns_id(&self, id: &str) -> bool {
        self.id == id || self.subsegments.iter().any(|sub| sub.owns_id(id))
    }

    fn collect_child_trace_ids(&self, ids: &mut Vec<String>) {
        ids.extend(
            self.links
                .iter()
                .filter(|link| link.is_child())
                .map(|link| link.trace_id.clone()),
        );
        for sub in &self.subsegments {
            sub.collect_child_trace_ids(ids);
        }
    }
}
