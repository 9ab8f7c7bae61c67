//! Mock event generation from registry schemas or schema files.

use camino::Utf8PathBuf;
use iatk_mock_event::{Schema, apply_overrides, generate};
use serde::Deserialize;
use serde_json::Value;

use super::{HANDLER_TARGET, HandlerContext, MethodError, output};

/// Event contexts a caller may ask for.
pub const SUPPORTED_CONTEXTS: [&str; 1] = ["eventbridge.v0"];

/// Parameters of `mock.generate_barebone_event`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields, default)]
pub struct GenerateBareboneEventParams {
    /// Schema registry holding the schema.
    pub registry_name: String,
    /// Schema name.
    pub schema_name: String,
    /// Schema version; latest when absent.
    pub schema_version: Option<String>,
    /// Event component to generate, for OpenAPI schemas.
    pub event_ref: Option<String>,
    /// Leave out optional properties.
    pub skip_optional: bool,
    /// Region override.
    pub region: Option<String>,
    /// Profile override.
    pub profile: Option<String>,
}

/// Parameters of `generate_mock_event`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields, default)]
pub struct GenerateMockEventParams {
    /// Schema registry holding the schema.
    pub registry_name: String,
    /// Schema name.
    pub schema_name: String,
    /// Schema version; latest when absent.
    pub schema_version: Option<String>,
    /// Local JSON or YAML schema file, used instead of the registry.
    pub schema_file: Option<Utf8PathBuf>,
    /// Event component to generate, for OpenAPI schemas.
    pub event_ref: Option<String>,
    /// Event contexts requested by the caller.
    pub context: Option<Vec<String>>,
    /// JSON object whose keys replace matching keys of the generated event.
    pub overrides: Option<String>,
    /// Leave out optional properties.
    pub skip_optional: bool,
    /// Region override.
    pub region: Option<String>,
    /// Profile override.
    pub profile: Option<String>,
}

impl GenerateMockEventParams {
    fn validate(&self) -> Result<(), MethodError> {
        let has_registry = !self.registry_name.is_empty() || !self.schema_name.is_empty();
        match (&self.schema_file, has_registry) {
            (Some(_), true) => {
                return Err(MethodError::invalid(
                    "only one of SchemaFile and RegistryName/SchemaName is needed, not both",
                ));
            }
            (None, _) if self.registry_name.is_empty() || self.schema_name.is_empty() => {
                return Err(MethodError::invalid(
                    "requires either \"SchemaFile\" or both \"RegistryName\" and \"SchemaName\"",
                ));
            }
            _ => {}
        }
        let unsupported = self
            .context
            .iter()
            .flatten()
            .find(|context| !SUPPORTED_CONTEXTS.contains(&context.as_str()));
        if let Some(context) = unsupported {
            return Err(MethodError::invalid(format!(
                "\"{context}\" is not a supported context. supported context: {SUPPORTED_CONTEXTS:?}"
            )));
        }
        Ok(())
    }
}

/// Generates a barebone event from a registry schema.
///
/// # Errors
///
/// Returns [`MethodError`] when the registry coordinates are incomplete or
/// the schema cannot be loaded or generated from.
pub fn generate_barebone_event(
    params: GenerateBareboneEventParams,
    ctx: &HandlerContext<'_>,
) -> Result<Value, MethodError> {
    if params.registry_name.is_empty() || params.schema_name.is_empty() {
        return Err(MethodError::invalid(
            "requires both \"RegistryName\" and \"SchemaName\"",
        ));
    }
    let clients = ctx.clients(params.region.as_deref(), params.profile.as_deref())?;
    let schema = Schema::from_registry(
        clients.schemas.as_ref(),
        ctx.call(),
        &params.registry_name,
        &params.schema_name,
        non_blank(params.schema_version.as_deref()),
        params.event_ref.filter(|event_ref| !event_ref.is_empty()),
    )
    .map_err(|source| MethodError::Schema { source })?;
    let event =
        generate(&schema, params.skip_optional).map_err(|source| MethodError::Generate { source })?;
    output(&event)
}

/// Generates an event from a registry schema or a schema file and applies
/// the caller's overrides.
///
/// # Errors
///
/// Returns [`MethodError`] for conflicting schema sources, an unsupported
/// context, or when loading, generating or overriding fails.
pub fn generate_mock_event(
    params: GenerateMockEventParams,
    ctx: &HandlerContext<'_>,
) -> Result<Value, MethodError> {
    params.validate()?;
    let event_ref = params.event_ref.filter(|event_ref| !event_ref.is_empty());
    let schema = if let Some(path) = &params.schema_file {
        Schema::from_file(path, event_ref)
    } else {
        let clients = ctx.clients(params.region.as_deref(), params.profile.as_deref())?;
        Schema::from_registry(
            clients.schemas.as_ref(),
            ctx.call(),
            &params.registry_name,
            &params.schema_name,
            non_blank(params.schema_version.as_deref()),
            event_ref,
        )
    }
    .map_err(|source| MethodError::Schema { source })?;

    let generated =
        generate(&schema, params.skip_optional).map_err(|source| MethodError::Generate { source })?;
    let event = match params.overrides.as_deref().filter(|text| !text.trim().is_empty()) {
        Some(overrides) => apply_overrides(&generated, overrides)
            .map_err(|source| MethodError::Overrides { source })?,
        None => generated,
    };
    tracing::debug!(
        target: HANDLER_TARGET,
        schema_type = %schema.schema_type,
        bytes = event.len(),
        "generated mock event"
    );
    output(&event)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn registry_params() -> GenerateMockEventParams {
        GenerateMockEventParams {
            registry_name: "registry".to_owned(),
            schema_name: "schema".to_owned(),
            ..GenerateMockEventParams::default()
        }
    }

    #[rstest]
    fn registry_coordinates_are_enough() {
        assert!(registry_params().validate().is_ok());
    }

    #[rstest]
    fn schema_file_alone_is_enough() {
        let params = GenerateMockEventParams {
            schema_file: Some(Utf8PathBuf::from("schema.json")),
            ..GenerateMockEventParams::default()
        };
        assert!(params.validate().is_ok());
    }

    #[rstest]
    fn both_sources_are_rejected() {
        let params = GenerateMockEventParams {
            schema_file: Some(Utf8PathBuf::from("schema.json")),
            ..registry_params()
        };
        let error = params.validate().expect_err("conflict");
        assert!(error.to_string().contains("not both"));
    }

    #[rstest]
    #[case("", "")]
    #[case("registry", "")]
    #[case("", "schema")]
    fn incomplete_registry_coordinates_are_rejected(#[case] registry: &str, #[case] schema: &str) {
        let params = GenerateMockEventParams {
            registry_name: registry.to_owned(),
            schema_name: schema.to_owned(),
            ..GenerateMockEventParams::default()
        };
        let error = params.validate().expect_err("incomplete");
        assert!(error.to_string().starts_with("requires either \"SchemaFile\""));
    }

    #[rstest]
    #[case(vec!["eventbridge.v0"], None)]
    #[case(vec![], None)]
    #[case(vec!["eventbridge.v0", "sqs.v0"], Some("\"sqs.v0\" is not a supported context. supported context: [\"eventbridge.v0\"]"))]
    fn contexts_are_checked(#[case] contexts: Vec<&str>, #[case] message: Option<&str>) {
        let params = GenerateMockEventParams {
            context: Some(contexts.into_iter().map(str::to_owned).collect()),
            ..registry_params()
        };
        assert_eq!(
            params.validate().err().map(|error| error.to_string()).as_deref(),
            message
        );
    }
}
