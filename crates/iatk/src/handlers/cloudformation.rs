//! Stack lookups: physical ids and outputs.

use std::collections::BTreeMap;

use iatk_cloud::CallContext;
use iatk_cloud::cloudformation::CloudFormationApi;
use iatk_harness::dedup;
use serde::Deserialize;
use serde_json::Value;

use super::{HANDLER_TARGET, HandlerContext, MethodError, output, require};

/// Parameters of `get_physical_id`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields, default)]
pub struct GetPhysicalIdParams {
    /// Stack owning the resource.
    pub stack_name: String,
    /// Logical id of the resource in the template.
    pub logical_resource_id: String,
    /// Region override.
    pub region: Option<String>,
    /// Profile override.
    pub profile: Option<String>,
}

/// Parameters of `get_stack_outputs`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields, default)]
pub struct GetStackOutputsParams {
    /// Stack to read.
    pub stack_name: String,
    /// Output keys to return; duplicates are ignored.
    pub output_names: Vec<String>,
    /// Region override.
    pub region: Option<String>,
    /// Profile override.
    pub profile: Option<String>,
}

/// Returns the physical id of a stack resource.
///
/// # Errors
///
/// Returns [`MethodError`] for blank parameters or a failed lookup.
pub fn get_physical_id(
    params: GetPhysicalIdParams,
    ctx: &HandlerContext<'_>,
) -> Result<Value, MethodError> {
    require(&params.stack_name, "StackName")?;
    require(&params.logical_resource_id, "LogicalResourceId")?;
    let clients = ctx.clients(params.region.as_deref(), params.profile.as_deref())?;
    let physical_id = clients.cloudformation.describe_stack_resource(
        ctx.call(),
        &params.stack_name,
        &params.logical_resource_id,
    )?;
    output(&physical_id)
}

/// Returns the requested outputs of a stack as a key/value map.
///
/// # Errors
///
/// Returns [`MethodError::MissingOutputs`] unless every distinct requested
/// key was found.
pub fn get_stack_outputs(
    params: GetStackOutputsParams,
    ctx: &HandlerContext<'_>,
) -> Result<Value, MethodError> {
    require(&params.stack_name, "StackName")?;
    let clients = ctx.clients(params.region.as_deref(), params.profile.as_deref())?;
    let outputs = stack_outputs(
        clients.cloudformation.as_ref(),
        ctx.call(),
        &params.stack_name,
        &params.output_names,
    )?;
    output(&outputs)
}

/// Collects the distinct `keys` from the outputs of `stack_name`, following
/// every page.
///
/// # Errors
///
/// Returns [`MethodError::Cloud`] when a page cannot be read and
/// [`MethodError::MissingOutputs`] when a key is absent.
pub fn stack_outputs(
    api: &dyn CloudFormationApi,
    ctx: &CallContext,
    stack_name: &str,
    keys: &[String],
) -> Result<BTreeMap<String, String>, MethodError> {
    let wanted = dedup(keys);
    let mut found = BTreeMap::new();
    let mut next_token: Option<String> = None;
    loop {
        let page = api.describe_stacks(ctx, stack_name, next_token.as_deref())?;
        for stack in page.stacks.iter().filter(|stack| stack.name == stack_name) {
            for stack_output in &stack.outputs {
                if wanted.contains(&stack_output.key) {
                    found.insert(stack_output.key.clone(), stack_output.value.clone());
                }
            }
        }
        next_token = page.next_token;
        if next_token.is_none() {
            break;
        }
    }

    if found.len() != wanted.len() {
        tracing::debug!(
            target: HANDLER_TARGET,
            stack = stack_name,
            requested = ?wanted,
            found = ?found.keys().collect::<Vec<_>>(),
            "stack outputs incomplete"
        );
        return Err(MethodError::MissingOutputs);
    }
    Ok(found)
}
