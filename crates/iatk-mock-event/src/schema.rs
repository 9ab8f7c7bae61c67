//! Schema sources.

use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use iatk_cloud::schemas::SchemasApi;
use iatk_cloud::{ApiError, CallContext};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

const SCHEMA_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::schema");

/// Dialect of a schema document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString)]
pub enum SchemaType {
    /// OpenAPI 3 document whose events live under `components.schemas`.
    #[strum(serialize = "OpenApi3")]
    OpenApi3,
    /// JSON Schema draft 4 document describing one event.
    #[strum(serialize = "JSONSchemaDraft4")]
    JsonSchemaDraft4,
}

impl SchemaType {
    /// Infers the dialect of a parsed document: a top-level `openapi` key
    /// marks OpenAPI 3, anything else is treated as JSON Schema draft 4.
    #[must_use]
    pub fn infer(document: &Value) -> Self {
        if document.get("openapi").is_some() {
            Self::OpenApi3
        } else {
            Self::JsonSchemaDraft4
        }
    }
}

/// Errors raised while loading a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The registry call failed.
    #[error("failed to get the schema {schema}: {source}")]
    Registry {
        /// Schema name.
        schema: String,
        /// Provider error.
        #[source]
        source: ApiError,
    },
    /// The registry reported a dialect this crate cannot generate from.
    #[error("unsupported schema type \"{schema_type}\"")]
    UnsupportedType {
        /// Reported type.
        schema_type: String,
    },
    /// The schema file could not be read.
    #[error("failed to read schema file \"{path}\": {source}")]
    ReadFile {
        /// File path.
        path: Utf8PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The schema file is neither JSON nor YAML.
    #[error("failed to parse schema file \"{path}\": {message}")]
    ParseFile {
        /// File path.
        path: Utf8PathBuf,
        /// Parser message.
        message: String,
    },
}

/// A schema document ready for generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// JSON text of the document.
    pub content: String,
    /// Document dialect.
    pub schema_type: SchemaType,
    /// Event component to generate, for OpenAPI documents.
    pub event_ref: Option<String>,
}

impl Schema {
    /// Loads a schema from the registry, optionally pinned to a version.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Registry`] when the call fails and
    /// [`SchemaError::UnsupportedType`] for an unknown dialect.
    pub fn from_registry(
        api: &dyn SchemasApi,
        ctx: &CallContext,
        registry_name: &str,
        schema_name: &str,
        schema_version: Option<&str>,
        event_ref: Option<String>,
    ) -> Result<Self, SchemaError> {
        let description = api
            .describe_schema(ctx, registry_name, schema_name, schema_version)
            .map_err(|source| SchemaError::Registry {
                schema: schema_name.to_owned(),
                source,
            })?;
        let schema_type = SchemaType::from_str(&description.schema_type).map_err(|_| {
            SchemaError::UnsupportedType {
                schema_type: description.schema_type.clone(),
            }
        })?;
        tracing::debug!(
            target: SCHEMA_TARGET,
            registry = registry_name,
            schema = schema_name,
            version = %description.version,
            %schema_type,
            "loaded registry schema"
        );
        Ok(Self {
            content: description.content,
            schema_type,
            event_ref,
        })
    }

    /// Loads a schema from a JSON or YAML file and infers its dialect.
    ///
    /// Files ending in `.yaml` or `.yml` are read as YAML, everything else as
    /// JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::ReadFile`] or [`SchemaError::ParseFile`].
    pub fn from_file(path: &Utf8Path, event_ref: Option<String>) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path).map_err(|source| SchemaError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let parse_error = |message: String| SchemaError::ParseFile {
            path: path.to_path_buf(),
            message,
        };
        let document: Value = if is_yaml(path) {
            serde_saphyr::from_str(&text).map_err(|error| parse_error(error.to_string()))?
        } else {
            serde_json::from_str(&text).map_err(|error| parse_error(error.to_string()))?
        };
        let content =
            serde_json::to_string(&document).map_err(|error| parse_error(error.to_string()))?;
        Ok(Self {
            content,
            schema_type: SchemaType::infer(&document),
            event_ref,
        })
    }
}

fn is_yaml(path: &Utf8Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use iatk_cloud::memory::MemoryCloud;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::from_path_buf(dir.path().join(name)).expect("utf-8 path");
        let mut file = std::fs::File::create(&path).expect("create");
        file.write_all(body.as_bytes()).expect("write");
        path
    }

    #[rstest]
    #[case(json!({"openapi": "3.0.0"}), SchemaType::OpenApi3)]
    #[case(json!({"$schema": "http://json-schema.org/draft-04/schema#"}), SchemaType::JsonSchemaDraft4)]
    #[case(json!({"type": "object"}), SchemaType::JsonSchemaDraft4)]
    fn infers_dialect(#[case] document: Value, #[case] expected: SchemaType) {
        assert_eq!(SchemaType::infer(&document), expected);
    }

    #[test]
    fn reads_registry_schema() {
        let cloud = MemoryCloud::new();
        cloud.add_schema("reg", "orders", "OpenApi3", r#"{"openapi":"3.0.0"}"#);

        let schema = Schema::from_registry(
            &cloud,
            &CallContext::new(),
            "reg",
            "orders",
            None,
            Some("Order".to_owned()),
        )
        .expect("schema");

        assert_eq!(schema.schema_type, SchemaType::OpenApi3);
        assert_eq!(schema.event_ref.as_deref(), Some("Order"));
    }

    #[test]
    fn missing_registry_schema_names_it() {
        let cloud = MemoryCloud::new();
        let error = Schema::from_registry(&cloud, &CallContext::new(), "reg", "gone", None, None)
            .expect_err("missing");
        assert!(error.to_string().starts_with("failed to get the schema gone: "));
    }

    #[test]
    fn rejects_unknown_registry_dialect() {
        let cloud = MemoryCloud::new();
        cloud.add_schema("reg", "odd", "Avro", "{}");
        let error = Schema::from_registry(&cloud, &CallContext::new(), "reg", "odd", None, None)
            .expect_err("unsupported");
        assert_eq!(error.to_string(), "unsupported schema type \"Avro\"");
    }

    #[test]
    fn reads_json_and_yaml_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let json_path = write_file(&dir, "event.json", r#"{"type":"object"}"#);
        let yaml_path = write_file(
            &dir,
            "api.yaml",
            "openapi: 3.0.0\ncomponents:\n  schemas:\n    Order:\n      type: object\n",
        );

        let from_json = Schema::from_file(&json_path, None).expect("json");
        let from_yaml = Schema::from_file(&yaml_path, Some("Order".to_owned())).expect("yaml");

        assert_eq!(from_json.schema_type, SchemaType::JsonSchemaDraft4);
        assert_eq!(from_yaml.schema_type, SchemaType::OpenApi3);
        let parsed: Value = serde_json::from_str(&from_yaml.content).expect("json content");
        assert_eq!(parsed["components"]["schemas"]["Order"]["type"], "object");
    }

    #[test]
    fn reports_unreadable_file() {
        let error = Schema::from_file(Utf8Path::new("/definitely/not/here.json"), None)
            .expect_err("missing file");
        assert!(matches!(error, SchemaError::ReadFile { .. }));
    }
}
