//! Hand-written parameter and return shapes of every method.

use std::collections::BTreeMap;

use serde::Serialize;

/// Shape of a value, in the vocabulary of JSON Schema types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    /// `string`, `integer`, `bool`, `object` or `array`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Named fields of an object.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<&'static str, Property>,
    /// Element shape of an array.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Property>>,
}

impl Property {
    fn scalar(kind: &'static str) -> Self {
        Self {
            kind,
            properties: BTreeMap::new(),
            items: None,
        }
    }

    /// A string.
    #[must_use]
    pub fn string() -> Self {
        Self::scalar("string")
    }

    /// An integer.
    #[must_use]
    pub fn integer() -> Self {
        Self::scalar("integer")
    }

    /// A boolean.
    #[must_use]
    pub fn boolean() -> Self {
        Self::scalar("bool")
    }

    /// A free-form string map.
    #[must_use]
    pub fn map() -> Self {
        Self::scalar("object")
    }

    /// An object with the given fields.
    #[must_use]
    pub fn object(fields: impl IntoIterator<Item = (&'static str, Self)>) -> Self {
        Self {
            properties: fields.into_iter().collect(),
            ..Self::scalar("object")
        }
    }

    /// An array of `items`.
    #[must_use]
    pub fn array(items: Self) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::scalar("array")
        }
    }
}

/// Parameters and return shape of one method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodSpec {
    /// Params object.
    pub parameters: Property,
    /// Value placed under `result.output`.
    pub returns: Property,
}

#[derive(Serialize)]
struct SpecTable {
    methods: BTreeMap<&'static str, MethodSpec>,
}

/// Renders the specification of every registered method as pretty JSON.
///
/// # Errors
///
/// Returns the encoder error.
pub fn specs_json() -> Result<String, serde_json::Error> {
    let table = SpecTable {
        methods: super::entries()
            .map(|entry| (entry.name, (entry.spec)()))
            .collect(),
    };
    serde_json::to_string_pretty(&table)
}

fn with_location(
    fields: impl IntoIterator<Item = (&'static str, Property)>,
) -> Property {
    Property::object(
        fields
            .into_iter()
            .chain([("Region", Property::string()), ("Profile", Property::string())]),
    )
}

fn resource() -> Property {
    Property::object([
        ("Type", Property::string()),
        ("PhysicalID", Property::string()),
        ("ARN", Property::string()),
    ])
}

fn segment() -> Property {
    Property::object([
        ("id", Property::string()),
        ("name", Property::string()),
        ("trace_id", Property::string()),
        ("start_time", Property::scalar("number")),
        ("parent_id", Property::string()),
        ("origin", Property::string()),
        ("links", Property::array(Property::map())),
        ("subsegments", Property::array(Property::map())),
    ])
}

pub(super) fn get_physical_id() -> MethodSpec {
    MethodSpec {
        parameters: with_location([
            ("StackName", Property::string()),
            ("LogicalResourceId", Property::string()),
        ]),
        returns: Property::string(),
    }
}

pub(super) fn get_stack_outputs() -> MethodSpec {
    MethodSpec {
        parameters: with_location([
            ("StackName", Property::string()),
            ("OutputNames", Property::array(Property::string())),
        ]),
        returns: Property::map(),
    }
}

pub(super) fn add_listener() -> MethodSpec {
    MethodSpec {
        parameters: with_location([
            ("EventBusName", Property::string()),
            ("RuleName", Property::string()),
            ("TargetId", Property::string()),
            ("Tags", Property::map()),
        ]),
        returns: Property::object([
            ("Id", Property::string()),
            ("TargetUnderTest", resource()),
            ("Components", Property::array(resource())),
        ]),
    }
}

pub(super) fn remove_listeners() -> MethodSpec {
    MethodSpec {
        parameters: with_location([
            ("Ids", Property::array(Property::string())),
            (
                "TagFilters",
                Property::array(Property::object([
                    ("Key", Property::string()),
                    ("Values", Property::array(Property::string())),
                ])),
            ),
        ]),
        returns: Property::string(),
    }
}

pub(super) fn poll_events() -> MethodSpec {
    MethodSpec {
        parameters: with_location([
            ("ListenerId", Property::string()),
            ("WaitTimeSeconds", Property::integer()),
            ("MaxNumberOfMessages", Property::integer()),
        ]),
        returns: Property::array(Property::string()),
    }
}

pub(super) fn get_trace_tree() -> MethodSpec {
    MethodSpec {
        parameters: with_location([
            ("TracingHeader", Property::string()),
            ("FetchChildTraces", Property::boolean()),
        ]),
        returns: Property::object([
            ("root", segment()),
            ("paths", Property::array(Property::array(segment()))),
            (
                "source_trace",
                Property::object([
                    ("id", Property::string()),
                    ("segments", Property::array(segment())),
                ]),
            ),
            ("linked_trace_limit_exceeded", Property::boolean()),
        ]),
    }
}

fn registry_schema_fields() -> [(&'static str, Property); 5] {
    [
        ("RegistryName", Property::string()),
        ("SchemaName", Property::string()),
        ("SchemaVersion", Property::string()),
        ("EventRef", Property::string()),
        ("SkipOptional", Property::boolean()),
    ]
}

pub(super) fn generate_barebone_event() -> MethodSpec {
    MethodSpec {
        parameters: with_location(registry_schema_fields()),
        returns: Property::string(),
    }
}

pub(super) fn generate_mock_event() -> MethodSpec {
    MethodSpec {
        parameters: with_location(registry_schema_fields().into_iter().chain([
            ("SchemaFile", Property::string()),
            ("Context", Property::array(Property::string())),
            ("Overrides", Property::string()),
        ])),
        returns: Property::string(),
    }
}
