//! CloudFormation client contract.

use crate::context::CallContext;
use crate::error::ApiError;

/// Service name recorded on CloudFormation errors.
pub const SERVICE: &str = "CloudFormation";

/// Output declared by a stack.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StackOutput {
    /// Output key.
    pub key: String,
    /// Output value.
    pub value: String,
}

/// Stack returned by `DescribeStacks`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StackDescription {
    /// Stack name.
    pub name: String,
    /// Declared outputs.
    pub outputs: Vec<StackOutput>,
}

/// One page of `DescribeStacks`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StackPage {
    /// Stacks on this page.
    pub stacks: Vec<StackDescription>,
    /// Token for the next page, absent on the last page.
    pub next_token: Option<String>,
}

/// Operations used against CloudFormation.
pub trait CloudFormationApi: Send + Sync {
    /// Returns the physical id of a stack resource.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the stack or resource does not exist.
    fn describe_stack_resource(
        &self,
        ctx: &CallContext,
        stack_name: &str,
        logical_resource_id: &str,
    ) -> Result<String, ApiError>;

    /// Lists one page of stacks matching `stack_name`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the stack does not exist or the call fails.
    fn describe_stacks(
        &self,
        ctx: &CallContext,
        stack_name: &str,
        next_token: Option<&str>,
    ) -> Result<StackPage, ApiError>;
}
