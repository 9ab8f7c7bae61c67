//! Method registry.
//!
//! The registry maps each wire method name to a decoder, which turns raw
//! params into a typed [`MethodCall`], and to the method's specification.
//! It is built once and never changes. [`MethodCall::handle`] consumes the
//! decoded call and runs its handler.

mod specs;

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub use specs::{MethodSpec, Property, specs_json};

use crate::handlers::cloudformation::{
    GetPhysicalIdParams, GetStackOutputsParams, get_physical_id, get_stack_outputs,
};
use crate::handlers::listener::{
    AddListenerParams, PollEventsParams, RemoveListenersParams, add_listener, poll_events,
    remove_listeners,
};
use crate::handlers::mock_event::{
    GenerateBareboneEventParams, GenerateMockEventParams, generate_barebone_event,
    generate_mock_event,
};
use crate::handlers::trace_tree::{GetTraceTreeParams, get_trace_tree};
use crate::handlers::{HandlerContext, MethodError};

/// Decodes raw params into a typed call.
pub type Decoder = fn(Value) -> Result<MethodCall, serde_json::Error>;

/// Decodes params into `T`; `null` decodes like an empty object, so every
/// field takes its default.
fn decode_params<T: DeserializeOwned>(params: Value) -> Result<T, serde_json::Error> {
    match params {
        Value::Null => serde_json::from_value(Value::Object(Map::new())),
        other => serde_json::from_value(other),
    }
}

/// A decoded request, tagged by method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodCall {
    /// `get_physical_id`.
    GetPhysicalId(GetPhysicalIdParams),
    /// `get_stack_outputs`.
    GetStackOutputs(GetStackOutputsParams),
    /// `test_harness.eventbridge.add_listener`.
    AddListener(AddListenerParams),
    /// `test_harness.eventbridge.remove_listeners`.
    RemoveListeners(RemoveListenersParams),
    /// `test_harness.eventbridge.poll_events`.
    PollEvents(PollEventsParams),
    /// `get_trace_tree`.
    GetTraceTree(GetTraceTreeParams),
    /// `mock.generate_barebone_event`.
    GenerateBareboneEvent(GenerateBareboneEventParams),
    /// `generate_mock_event`.
    GenerateMockEvent(GenerateMockEventParams),
}

impl MethodCall {
    /// Runs the handler of this call.
    ///
    /// # Errors
    ///
    /// Returns the handler's [`MethodError`].
    pub fn handle(self, ctx: &HandlerContext<'_>) -> Result<Value, MethodError> {
        match self {
            Self::GetPhysicalId(params) => get_physical_id(params, ctx),
            Self::GetStackOutputs(params) => get_stack_outputs(params, ctx),
            Self::AddListener(params) => add_listener(params, ctx),
            Self::RemoveListeners(params) => remove_listeners(params, ctx),
            Self::PollEvents(params) => poll_events(params, ctx),
            Self::GetTraceTree(params) => get_trace_tree(params, ctx),
            Self::GenerateBareboneEvent(params) => generate_barebone_event(params, ctx),
            Self::GenerateMockEvent(params) => generate_mock_event(params, ctx),
        }
    }
}

/// One registered method.
#[derive(Debug, Clone, Copy)]
pub struct MethodEntry {
    /// Wire name.
    pub name: &'static str,
    /// Params decoder.
    pub decode: Decoder,
    /// Builds the method's specification.
    pub spec: fn() -> MethodSpec,
}

static REGISTRY: Lazy<BTreeMap<&'static str, MethodEntry>> = Lazy::new(|| {
    [
        MethodEntry {
            name: "get_physical_id",
            decode: |params| decode_params(params).map(MethodCall::GetPhysicalId),
            spec: specs::get_physical_id,
        },
        MethodEntry {
            name: "get_stack_outputs",
            decode: |params| decode_params(params).map(MethodCall::GetStackOutputs),
            spec: specs::get_stack_outputs,
        },
        MethodEntry {
            name: "test_harness.eventbridge.add_listener",
            decode: |params| decode_params(params).map(MethodCall::AddListener),
            spec: specs::add_listener,
        },
        MethodEntry {
            name: "test_harness.eventbridge.remove_listeners",
            decode: |params| decode_params(params).map(MethodCall::RemoveListeners),
            spec: specs::remove_listeners,
        },
        MethodEntry {
            name: "test_harness.eventbridge.poll_events",
            decode: |params| decode_params(params).map(MethodCall::PollEvents),
            spec: specs::poll_events,
        },
        MethodEntry {
            name: "get_trace_tree",
            decode: |params| decode_params(params).map(MethodCall::GetTraceTree),
            spec: specs::get_trace_tree,
        },
        MethodEntry {
            name: "mock.generate_barebone_event",
            decode: |params| decode_params(params).map(MethodCall::GenerateBareboneEvent),
            spec: specs::generate_barebone_event,
        },
        MethodEntry {
            name: "generate_mock_event",
            decode: |params| decode_params(params).map(MethodCall::GenerateMockEvent),
            spec: specs::generate_mock_event,
        },
    ]
    .into_iter()
    .map(|entry| (entry.name, entry))
    .collect()
});

/// Returns the entry registered under `method`.
#[must_use]
pub fn lookup(method: &str) -> Option<&'static MethodEntry> {
    REGISTRY.get(method)
}

/// Every registered entry, ordered by name.
pub fn entries() -> impl Iterator<Item = &'static MethodEntry> {
    REGISTRY.values()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case("get_physical_id")]
    #[case("get_stack_outputs")]
    #[case("test_harness.eventbridge.add_listener")]
    #[case("test_harness.eventbridge.remove_listeners")]
    #[case("test_harness.eventbridge.poll_events")]
    #[case("get_trace_tree")]
    #[case("mock.generate_barebone_event")]
    #[case("generate_mock_event")]
    fn every_method_is_registered(#[case] name: &str) {
        let entry = lookup(name).expect("registered");
        assert_eq!(entry.name, name);
    }

    #[rstest]
    fn unknown_method_is_absent() {
        assert!(lookup("invalid-hello-world").is_none());
        assert_eq!(entries().count(), 8);
    }

    #[rstest]
    fn decoder_yields_the_tagged_call() {
        let entry = lookup("get_physical_id").expect("registered");
        let call = (entry.decode)(json!({"StackName": "s", "LogicalResourceId": "l"}))
            .expect("decoded");
        assert_eq!(
            call,
            MethodCall::GetPhysicalId(GetPhysicalIdParams {
                stack_name: "s".to_owned(),
                logical_resource_id: "l".to_owned(),
                ..GetPhysicalIdParams::default()
            })
        );
    }

    #[rstest]
    #[case("get_physical_id", json!({"StackName": "s", "DoesntExist": []}))]
    #[case("test_harness.eventbridge.poll_events", json!({"ListenerId": "x", "MaxNumberOfMessages": 90_000_000_000_i64}))]
    #[case("test_harness.eventbridge.poll_events", json!({"ListenerId": "x", "WaitTimeSeconds": 1.5}))]
    #[case("get_trace_tree", json!({"TracingHeader": 12}))]
    #[case("get_stack_outputs", json!("StackName"))]
    #[case("test_harness.eventbridge.remove_listeners", json!({"TagFilters": [{"Key": "k", "Other": 1}]}))]
    fn decoder_rejects_bad_params(#[case] method: &str, #[case] params: Value) {
        let entry = lookup(method).expect("registered");
        assert!((entry.decode)(params).is_err());
    }

    #[rstest]
    fn null_params_decode_to_defaults() {
        let entry = lookup("get_stack_outputs").expect("registered");
        let call = (entry.decode)(Value::Null).expect("decoded");
        assert_eq!(
            call,
            MethodCall::GetStackOutputs(GetStackOutputsParams::default())
        );
    }

    #[rstest]
    fn missing_fields_decode_to_defaults() {
        let entry = lookup("test_harness.eventbridge.poll_events").expect("registered");
        let call = (entry.decode)(json!({})).expect("decoded");
        assert_eq!(call, MethodCall::PollEvents(PollEventsParams::default()));
    }
}
