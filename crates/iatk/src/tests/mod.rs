//! Dispatch and handler tests against the in-memory cloud.


use std::sync::Arc;

use iatk_cloud::UnavailableProvider;
use iatk_cloud::memory::{MemoryCloud, MemoryProvider};
use iatk_config::Config;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use crate::dispatch::{dispatch, run_with_provider};

/// In-memory cloud, the provider serving it and the process configuration.
pub(crate) struct Harness {
    pub(crate) cloud: Arc<MemoryCloud>,
    pub(crate) provider: MemoryProvider,
    pub(crate) config: Config,
}

impl Harness {
    pub(crate) fn new(config: Config) -> Self {
        let cloud = Arc::new(MemoryCloud::new());
        let provider = MemoryProvider::new(Arc::clone(&cloud));
        Self {
            cloud,
            provider,
            config,
        }
    }

    /// Dispatches a raw request and returns the response as JSON.
    pub(crate) fn raw(&self, input: &str) -> Value {
        let response = dispatch(input.as_bytes(), &self.provider, &self.config);
        serde_json::to_value(&response).expect("response json")
    }

    /// Dispatches `method` with `params` under id `"1"`.
    pub(crate) fn call(&self, method: &str, params: Value) -> Value {
        self.call_with_metadata(method, params, None)
    }

    pub(crate) fn call_with_metadata(
        &self,
        method: &str,
        params: Value,
        metadata: Option<Value>,
    ) -> Value {
        let mut request = json!({"jsonrpc": "2.0", "id": "1", "method": method, "params": params});
        if let Some(meta) = metadata {
            request["metadata"] = meta;
        }
        self.raw(&request.to_string())
    }
}

/// Returns `result.output`, failing the test on an error response.
pub(crate) fn output(response: &Value) -> &Value {
    assert!(
        response.get("error").is_none(),
        "unexpected error response: {response}"
    );
    &response["result"]["output"]
}

/// Returns `(code, message)` of an error response.
pub(crate) fn error(response: &Value) -> (i64, String) {
    let error = response.get("error").expect("error response");
    (
        error["code"].as_i64().expect("code"),
        error["message"].as_str().expect("message").to_owned(),
    )
}

#[fixture]
pub(crate) fn harness() -> Harness {
    Harness::new(Config::default())
}

#[rstest]
#[case::not_json("not json")]
#[case::missing_version(r#"{"foo":"bar"}"#)]
#[case::empty("")]
fn unparsable_requests_get_parse_error_with_null_id(harness: Harness, #[case] input: &str) {
    assert_eq!(
        harness.raw(input),
        json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32700, "message": "Parse error"}})
    );
}

#[rstest]
fn unknown_method_echoes_the_id(harness: Harness) {
    let response =
        harness.raw(r#"{"jsonrpc":"2.0","id":"42","method":"invalid-hello-world","params":{}}"#);
    assert_eq!(
        response,
        json!({"jsonrpc": "2.0", "id": "42", "error": {"code": -32601, "message": "Method not found"}})
    );
}

#[rstest]
#[case::unknown_param(json!({"LogicalResourceId": "X", "StackName": "Y", "DoesntExist": []}))]
#[case::wrong_type(json!({"LogicalResourceId": 1, "StackName": "Y"}))]
fn undecodable_params_are_invalid_params(harness: Harness, #[case] params: Value) {
    let response = harness.call("get_physical_id", params);
    assert_eq!(
        response["error"],
        json!({"code": -32602, "message": "Invalid params"})
    );
    assert_eq!(response["id"], "1");
    assert!(harness.provider.requests().is_empty());
}

#[rstest]
fn null_params_reach_the_handler_as_defaults(harness: Harness) {
    let response =
        harness.raw(r#"{"jsonrpc":"2.0","id":"1","method":"get_physical_id","params":null}"#);
    assert_eq!(
        error(&response),
        (10, "missing required param \"StackName\"".to_owned())
    );
}

#[rstest]
fn absent_params_are_invalid_params(harness: Harness) {
    let response = harness.raw(r#"{"jsonrpc":"2.0","id":"1","method":"get_physical_id"}"#);
    assert_eq!(
        response["error"],
        json!({"code": -32602, "message": "Invalid params"})
    );
    assert!(harness.provider.requests().is_empty());
}

#[rstest]
fn overflowing_integer_is_invalid_params_but_out_of_range_is_application_error(harness: Harness) {
    let overflow = harness.call(
        "test_harness.eventbridge.poll_events",
        json!({"ListenerId": "iatk_eb_x", "MaxNumberOfMessages": 90_000_000_000_i64}),
    );
    let negative = harness.call(
        "test_harness.eventbridge.poll_events",
        json!({"ListenerId": "iatk_eb_x", "MaxNumberOfMessages": -200}),
    );

    assert_eq!(error(&overflow).0, -32602);
    assert_eq!(
        error(&negative),
        (
            10,
            "\"MaxNumberOfMessages\" must be an integer between 1 and 10".to_owned()
        )
    );
}

#[rstest]
fn null_id_is_echoed_as_null(harness: Harness) {
    let response = harness.raw(r#"{"jsonrpc":"2.0","id":null,"method":"nope","params":{}}"#);
    assert!(response["id"].is_null());
    assert_eq!(error(&response).0, -32601);
}

#[rstest]
fn unavailable_provider_is_reported_as_application_error() {
    let response = dispatch(
        br#"{"jsonrpc":"2.0","id":"7","method":"get_physical_id","params":{"StackName":"s","LogicalResourceId":"l"}}"#,
        &UnavailableProvider,
        &Config::default(),
    );
    let value = serde_json::to_value(&response).expect("json");
    let (code, message) = error(&value);
    assert_eq!(code, 10);
    assert!(message.starts_with("error when loading AWS config: cloud backend unavailable"));
}

#[rstest]
fn run_writes_exactly_one_line(harness: Harness) {
    let mut written = Vec::new();
    run_with_provider(
        &b"not json\n"[..],
        &mut written,
        &harness.provider,
        &harness.config,
    )
    .expect("run");

    let text = String::from_utf8(written).expect("utf-8");
    assert_eq!(
        text,
        "{\"jsonrpc\":\"2.0\",\"id\":null,\"error\":{\"code\":-32700,\"message\":\"Parse error\"}}\n"
    );
}

#[rstest]
fn unwritable_output_is_a_dispatch_error(harness: Harness) {
    struct Broken;
    impl std::io::Write for Broken {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("closed"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let error = run_with_provider(&b"{}"[..], Broken, &harness.provider, &harness.config)
        .expect_err("write fails");
    assert!(error.to_string().starts_with("failed to write response"));
}
