//! Placeholder event generation.
//!
//! Each property receives a value derived from its declaration: the first
//! `enum` entry when present, otherwise a zero value of its `type`. Objects
//! are generated recursively down to [`MAX_DEPTH`] levels, after which they
//! become `null`. Local `$ref` pointers are followed.

use serde_json::{Map, Value};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::schema::{Schema, SchemaType};

/// Nesting depth beyond which objects are emitted as `null`.
pub const MAX_DEPTH: usize = 20;

const COMPONENT_PREFIX: &str = "#/components/schemas/";

/// Errors raised while generating an event.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The schema document is empty.
    #[error("failed while loading schema due to error: invalid schema provided")]
    EmptySchema,
    /// The schema document is not valid JSON.
    #[error("failed while loading schema due to error: {source}")]
    Parse {
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
    /// An event reference was given for a JSON Schema document.
    #[error("failed while loading schema due to error: event ref not supported for json schemas")]
    EventRefNotSupported,
    /// An OpenAPI document was given without an event reference.
    #[error("no eventRef specified to generate a mock event")]
    MissingEventRef,
    /// The OpenAPI document has no `components` section.
    #[error("failed to generate a mock event, no components found in schema")]
    NoComponents,
    /// The OpenAPI document has no `components.schemas` section.
    #[error("failed to generate a mock event, no schemas found under components in schema")]
    NoComponentSchemas,
    /// The event reference names no component.
    #[error("provided eventRef \"{event_ref}\" not found in the schema")]
    EventRefNotFound {
        /// Requested reference.
        event_ref: String,
    },
    /// A property declares more than one type.
    #[error("cannot handle multiple type declaration for property \"{property}\"")]
    MultipleTypes {
        /// Property name.
        property: String,
    },
    /// A property declares a type with no placeholder.
    #[error("invalid or unsupported property type \"{kind}\" found for property \"{property}\"")]
    UnsupportedType {
        /// Declared type.
        kind: String,
        /// Property name.
        property: String,
    },
    /// A `$ref` does not resolve inside the document.
    #[error("cannot resolve reference \"{reference}\"")]
    UnresolvedRef {
        /// Reference text.
        reference: String,
    },
    /// The current time could not be rendered.
    #[error("cannot format timestamp: {source}")]
    Timestamp {
        /// Formatting failure.
        #[source]
        source: time::error::Format,
    },
    /// The event could not be encoded.
    #[error("cannot encode event into json: {source}")]
    Encode {
        /// Encoder error.
        #[source]
        source: serde_json::Error,
    },
}

/// Generates a JSON-encoded placeholder event from `schema`.
///
/// With `skip_optional`, properties absent from a non-empty `required` list
/// are left out.
///
/// # Errors
///
/// Returns [`GenerateError`] when the document is unusable for its dialect or
/// declares a property this generator cannot fill.
pub fn generate(schema: &Schema, skip_optional: bool) -> Result<String, GenerateError> {
    if schema.content.trim().is_empty() {
        return Err(GenerateError::EmptySchema);
    }
    let document: Value = serde_json::from_str(&schema.content)
        .map_err(|source| GenerateError::Parse { source })?;
    let event_ref = schema.event_ref.as_deref().filter(|value| !value.is_empty());
    let start = match schema.schema_type {
        SchemaType::JsonSchemaDraft4 => {
            if event_ref.is_some() {
                return Err(GenerateError::EventRefNotSupported);
            }
            &document
        }
        SchemaType::OpenApi3 => {
            let reference = event_ref.ok_or(GenerateError::MissingEventRef)?;
            component(&document, reference)?
        }
    };
    let generator = Generator {
        root: &document,
        skip_optional,
    };
    let event = generator.object(start, MAX_DEPTH)?;
    serde_json::to_string(&event).map_err(|source| GenerateError::Encode { source })
}

fn component<'a>(document: &'a Value, reference: &str) -> Result<&'a Value, GenerateError> {
    let components = document
        .get("components")
        .ok_or(GenerateError::NoComponents)?;
    let schemas = components
        .get("schemas")
        .and_then(Value::as_object)
        .ok_or(GenerateError::NoComponentSchemas)?;
    let name = reference.strip_prefix(COMPONENT_PREFIX).unwrap_or(reference);
    schemas
        .get(name)
        .ok_or_else(|| GenerateError::EventRefNotFound {
            event_ref: reference.to_owned(),
        })
}

struct Generator<'a> {
    root: &'a Value,
    skip_optional: bool,
}

impl<'a> Generator<'a> {
    fn resolve(&self, mut node: &'a Value) -> Result<&'a Value, GenerateError> {
        // Cyclic references stop after MAX_DEPTH hops.
        for _ in 0..=MAX_DEPTH {
            let Some(reference) = node.get("$ref").and_then(Value::as_str) else {
                return Ok(node);
            };
            node = reference
                .strip_prefix('#')
                .and_then(|pointer| self.root.pointer(pointer))
                .ok_or_else(|| GenerateError::UnresolvedRef {
                    reference: reference.to_owned(),
                })?;
        }
        Ok(node)
    }

    fn object(&self, node: &'a Value, depth: usize) -> Result<Map<String, Value>, GenerateError> {
        let schema = self.resolve(node)?;
        let mut event = Map::new();
        let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
            return Ok(event);
        };
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        for (name, property) in properties {
            if self.skip_optional && !required.is_empty() && !required.contains(&name.as_str()) {
                continue;
            }
            event.insert(name.clone(), self.value(name, property, depth)?);
        }
        Ok(event)
    }

    fn value(&self, name: &str, node: &'a Value, depth: usize) -> Result<Value, GenerateError> {
        let property = self.resolve(node)?;
        if let Some(first) = property
            .get("enum")
            .and_then(Value::as_array)
            .and_then(|values| values.first())
        {
            return Ok(first.clone());
        }
        let declared = match property.get("type") {
            Some(Value::String(kind)) => Some(kind.as_str()),
            Some(Value::Array(kinds)) => match kinds.as_slice() {
                [only] => only.as_str(),
                [] => None,
                _ => {
                    return Err(GenerateError::MultipleTypes {
                        property: name.to_owned(),
                    });
                }
            },
            _ => None,
        };
        let kind = declared.or_else(|| property.get("properties").map(|_| "object"));
        match kind {
            Some("string") => string_placeholder(property),
            Some("number" | "integer") => Ok(Value::from(0)),
            Some("boolean") => Ok(Value::Bool(false)),
            Some("array") => Ok(Value::Array(Vec::new())),
            Some("object") if depth == 0 => Ok(Value::Null),
            Some("object") => Ok(Value::Object(self.object(property, depth - 1)?)),
            Some("null") | None => Ok(Value::Null),
            Some(other) => Err(GenerateError::UnsupportedType {
                kind: other.to_owned(),
                property: name.to_owned(),
            }),
        }
    }
}

fn string_placeholder(property: &Value) -> Result<Value, GenerateError> {
    if property.get("format").and_then(Value::as_str) == Some("date-time") {
        let now = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|source| GenerateError::Timestamp { source })?;
        return Ok(Value::String(now));
    }
    Ok(Value::String(String::new()))
}
