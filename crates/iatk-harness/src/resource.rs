//! Wire description of a cloud resource owned or targeted by a harness.

use serde::{Deserialize, Serialize};

/// Resource kinds a harness reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
pub enum ResourceType {
    /// Capture queue; the physical id is the queue URL.
    #[serde(rename = "AWS::SQS::Queue")]
    #[strum(serialize = "AWS::SQS::Queue")]
    Queue,
    /// Event rule; the physical id is the rule name.
    #[serde(rename = "AWS::Events::Rule")]
    #[strum(serialize = "AWS::Events::Rule")]
    Rule,
    /// Event bus; the physical id is the bus name.
    #[serde(rename = "AWS::Events::EventBus")]
    #[strum(serialize = "AWS::Events::EventBus")]
    EventBus,
}

/// `{Type, PhysicalID, ARN}` triple returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource kind.
    #[serde(rename = "Type")]
    pub resource_type: ResourceType,
    /// Service-specific identifier.
    #[serde(rename = "PhysicalID")]
    pub physical_id: String,
    /// Fully qualified resource name.
    #[serde(rename = "ARN")]
    pub arn: String,
}

impl Resource {
    /// Creates a resource description.
    #[must_use]
    pub fn new(
        resource_type: ResourceType,
        physical_id: impl Into<String>,
        arn: impl Into<String>,
    ) -> Self {
        Self {
            resource_type,
            physical_id: physical_id.into(),
            arn: arn.into(),
        }
    }
}
