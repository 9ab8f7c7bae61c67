//! EventBridge Schemas client contract.

use crate::context::CallContext;
use crate::error::ApiError;

/// Service name recorded on schema registry errors.
pub const SERVICE: &str = "Schemas";

/// Schema returned by `DescribeSchema`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaDescription {
    /// Schema document.
    pub content: String,
    /// Schema type, `OpenApi3` or `JSONSchemaDraft4`.
    pub schema_type: String,
    /// Version returned by the registry.
    pub version: String,
}

/// Operations used against the schema registry.
pub trait SchemasApi: Send + Sync {
    /// Describes a schema, optionally pinned to a version.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the schema does not exist or the call fails.
    fn describe_schema(
        &self,
        ctx: &CallContext,
        registry_name: &str,
        schema_name: &str,
        schema_version: Option<&str>,
    ) -> Result<SchemaDescription, ApiError>;
}
