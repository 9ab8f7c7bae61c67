//! EventBridge client contract.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::context::CallContext;
use crate::error::ApiError;

/// Service name recorded on EventBridge errors.
pub const SERVICE: &str = "EventBridge";

/// Event bus returned by `DescribeEventBus`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBusDescription {
    /// Bus name.
    pub name: String,
    /// Bus ARN.
    pub arn: String,
}

/// Rule returned by `DescribeRule`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDescription {
    /// Rule name.
    pub name: String,
    /// Bus the rule belongs to.
    pub event_bus_name: String,
    /// Event pattern document, empty for scheduled rules.
    pub event_pattern: String,
    /// Rule ARN.
    pub arn: String,
}

/// Input transformer attached to a rule target.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InputTransformer {
    /// Template applied to the extracted paths.
    pub input_template: String,
    /// JSON paths extracted from the event, keyed by placeholder name.
    #[serde(default)]
    pub input_paths_map: BTreeMap<String, String>,
}

/// Rule target with its input shaping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Target {
    /// Target id, unique within the rule.
    pub id: String,
    /// ARN of the receiving resource.
    pub arn: String,
    /// Constant JSON text delivered instead of the event.
    pub input: Option<String>,
    /// JSON path selecting part of the event.
    pub input_path: Option<String>,
    /// Template-based rewrite of the event.
    pub input_transformer: Option<InputTransformer>,
}

/// One page of `ListTargetsByRule`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TargetPage {
    /// Targets on this page.
    pub targets: Vec<Target>,
    /// Token for the next page, absent on the last page.
    pub next_token: Option<String>,
}

/// Arguments to `PutRule`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PutRuleRequest {
    /// Rule name.
    pub name: String,
    /// Bus receiving the rule.
    pub event_bus_name: String,
    /// Event pattern document.
    pub event_pattern: String,
    /// Human readable description.
    pub description: String,
    /// Tags applied at creation.
    pub tags: BTreeMap<String, String>,
}

/// Operations used against EventBridge.
pub trait EventBridgeApi: Send + Sync {
    /// Describes the named event bus.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the bus does not exist or the call fails.
    fn describe_event_bus(&self, ctx: &CallContext, name: &str)
    -> Result<EventBusDescription, ApiError>;

    /// Describes a rule on the named bus.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the rule does not exist or the call fails.
    fn describe_rule(
        &self,
        ctx: &CallContext,
        name: &str,
        event_bus_name: &str,
    ) -> Result<RuleDescription, ApiError>;

    /// Lists one page of targets attached to a rule.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the rule does not exist or the call fails.
    fn list_targets_by_rule(
        &self,
        ctx: &CallContext,
        rule: &str,
        event_bus_name: &str,
        next_token: Option<&str>,
    ) -> Result<TargetPage, ApiError>;

    /// Creates or updates a rule and returns its ARN.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the service rejects the rule.
    fn put_rule(&self, ctx: &CallContext, request: &PutRuleRequest) -> Result<String, ApiError>;

    /// Attaches targets to a rule.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the service rejects any target.
    fn put_targets(
        &self,
        ctx: &CallContext,
        rule: &str,
        event_bus_name: &str,
        targets: &[Target],
    ) -> Result<(), ApiError>;

    /// Detaches targets from a rule.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the call fails.
    fn remove_targets(
        &self,
        ctx: &CallContext,
        rule: &str,
        event_bus_name: &str,
        ids: &[String],
    ) -> Result<(), ApiError>;

    /// Deletes a rule that has no targets.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the call fails.
    fn delete_rule(&self, ctx: &CallContext, name: &str, event_bus_name: &str)
    -> Result<(), ApiError>;
}
