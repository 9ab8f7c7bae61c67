//! Event rule driver.

use std::collections::BTreeMap;

use iatk_cloud::eventbridge::{EventBridgeApi, PutRuleRequest, Target};
use iatk_cloud::{Arn, CallContext};

use super::DriverError;
use super::queue::Queue;
use crate::resource::{Resource, ResourceType};

const RULE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::drivers::rule");

/// Rule on an event bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Rule name, the physical id.
    pub name: String,
    /// Bus owning the rule.
    pub event_bus_name: String,
    /// Event pattern document.
    pub event_pattern: String,
    /// Rule ARN.
    pub arn: Arn,
}

impl Rule {
    /// Describes the rule as a [`Resource`].
    #[must_use]
    pub fn resource(&self) -> Resource {
        Resource::new(ResourceType::Rule, self.name.as_str(), self.arn.to_string())
    }
}

/// Creates a rule on `event_bus_name` with tags applied at creation.
///
/// # Errors
///
/// Returns [`DriverError`] when the service rejects the rule.
pub fn create(
    api: &dyn EventBridgeApi,
    ctx: &CallContext,
    name: &str,
    event_bus_name: &str,
    event_pattern: &str,
    description: &str,
    tags: &BTreeMap<String, String>,
) -> Result<Rule, DriverError> {
    tracing::debug!(target: RULE_TARGET, rule = name, bus = event_bus_name, "creating rule");
    let request = PutRuleRequest {
        name: name.to_owned(),
        event_bus_name: event_bus_name.to_owned(),
        event_pattern: event_pattern.to_owned(),
        description: description.to_owned(),
        tags: tags.clone(),
    };
    let context = || format!("put rule \"{name}\" failed");
    let raw_arn = api
        .put_rule(ctx, &request)
        .map_err(|source| DriverError::call(context(), source))?;
    let arn = raw_arn
        .parse()
        .map_err(|source| DriverError::invalid_arn(context(), source))?;
    tracing::debug!(target: RULE_TARGET, rule = %raw_arn, "created rule");
    Ok(Rule {
        name: name.to_owned(),
        event_bus_name: event_bus_name.to_owned(),
        event_pattern: event_pattern.to_owned(),
        arn,
    })
}

/// Removes every target of the rule, then deletes it.
///
/// # Errors
///
/// Returns [`DriverError`] when listing, detaching or deleting fails.
pub fn delete(
    api: &dyn EventBridgeApi,
    ctx: &CallContext,
    event_bus_name: &str,
    name: &str,
) -> Result<(), DriverError> {
    let context = || format!("failed to delete rule \"{name}\"");
    let ids: Vec<String> = all_targets(api, ctx, name, event_bus_name)
        .map_err(|source| DriverError::call(context(), source))?
        .into_iter()
        .map(|target| target.id)
        .collect();
    if !ids.is_empty() {
        api.remove_targets(ctx, name, event_bus_name, &ids)
            .map_err(|source| DriverError::call(context(), source))?;
    }
    tracing::debug!(target: RULE_TARGET, rule = name, bus = event_bus_name, "deleting rule");
    api.delete_rule(ctx, name, event_bus_name)
        .map_err(|source| DriverError::call(context(), source))?;
    tracing::debug!(target: RULE_TARGET, rule = name, "deleted rule");
    Ok(())
}

/// Reads a rule's pattern and ARN.
///
/// # Errors
///
/// Returns [`DriverError`] when the rule does not exist.
pub fn get(
    api: &dyn EventBridgeApi,
    ctx: &CallContext,
    name: &str,
    event_bus_name: &str,
) -> Result<Rule, DriverError> {
    let context = || format!("failed to describe rule \"{name}\" of event bus \"{event_bus_name}\"");
    let description = api
        .describe_rule(ctx, name, event_bus_name)
        .map_err(|source| DriverError::call(context(), source))?;
    let arn = description
        .arn
        .parse()
        .map_err(|source| DriverError::invalid_arn(context(), source))?;
    Ok(Rule {
        name: name.to_owned(),
        event_bus_name: event_bus_name.to_owned(),
        event_pattern: description.event_pattern,
        arn,
    })
}

/// Finds the target with id `target_id` on a rule.
///
/// An empty `target_id` asks for no target and yields `Ok(None)` without a
/// call.
///
/// # Errors
///
/// Returns [`DriverError::TargetNotFound`] when no page contains the target,
/// or the listing error.
pub fn list_targets_by_rule(
    api: &dyn EventBridgeApi,
    ctx: &CallContext,
    target_id: &str,
    name: &str,
    event_bus_name: &str,
) -> Result<Option<Target>, DriverError> {
    if target_id.is_empty() {
        return Ok(None);
    }
    let mut token: Option<String> = None;
    loop {
        let page = api
            .list_targets_by_rule(ctx, name, event_bus_name, token.as_deref())
            .map_err(|source| {
                DriverError::call(format!("failed to list targets of rule \"{name}\""), source)
            })?;
        if let Some(target) = page.targets.into_iter().find(|target| target.id == target_id) {
            return Ok(Some(target));
        }
        match page.next_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }
    Err(DriverError::TargetNotFound {
        target_id: target_id.to_owned(),
        rule: name.to_owned(),
        event_bus: event_bus_name.to_owned(),
    })
}

/// Binds `queue` as the single target of `rule`, carrying the input shaping
/// of `source`.
///
/// # Errors
///
/// Returns [`DriverError::ConflictingInput`] when `source` sets more than one
/// shaping option, or the call error.
pub fn put_queue_target(
    api: &dyn EventBridgeApi,
    ctx: &CallContext,
    listener_id: &str,
    queue: &Queue,
    rule: &Rule,
    source: Option<&Target>,
) -> Result<(), DriverError> {
    let target = queue_target(listener_id, queue, source)?;
    tracing::debug!(target: RULE_TARGET, queue = %queue.url, "binding queue as rule target");
    api.put_targets(ctx, &rule.name, &rule.event_bus_name, &[target])
        .map_err(|source_error| DriverError::call("put rule target failed", source_error))?;
    Ok(())
}

/// Builds the queue target with the shaping copied from `source`.
///
/// # Errors
///
/// Returns [`DriverError::ConflictingInput`] when `source` sets more than one
/// shaping option.
pub fn queue_target(
    listener_id: &str,
    queue: &Queue,
    source: Option<&Target>,
) -> Result<Target, DriverError> {
    let mut target = Target {
        id: listener_id.to_owned(),
        arn: queue.arn.to_string(),
        ..Target::default()
    };
    let Some(shaping) = source else {
        return Ok(target);
    };
    let options_set = [
        shaping.input.is_some(),
        shaping.input_path.is_some(),
        shaping.input_transformer.is_some(),
    ]
    .into_iter()
    .filter(|set| *set)
    .count();
    if options_set > 1 {
        return Err(DriverError::ConflictingInput);
    }
    target.input.clone_from(&shaping.input);
    target.input_path.clone_from(&shaping.input_path);
    target.input_transformer.clone_from(&shaping.input_transformer);
    Ok(target)
}

fn all_targets(
    api: &dyn EventBridgeApi,
    ctx: &CallContext,
    name: &str,
    event_bus_name: &str,
) -> Result<Vec<Target>, iatk_cloud::ApiError> {
    let mut targets = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let page = api.list_targets_by_rule(ctx, name, event_bus_name, token.as_deref())?;
        targets.extend(page.targets);
        match page.next_token {
            Some(next) => token = Some(next),
            None => return Ok(targets),
        }
    }
}
