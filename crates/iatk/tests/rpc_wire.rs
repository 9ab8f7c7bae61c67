//! Integration tests for the `iatk` binary wire protocol.
//!
//! Each run feeds one request on stdin and checks the single response line
//! written to stdout. No cloud backend is configured, so only requests that
//! fail before reaching the cloud (or never need it) are exercised here.

use std::io::Write;

use anyhow::{Context, Result, anyhow, ensure};
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;
use rstest::rstest;
use serde_json::{Value, json};

fn response_for(request: &str) -> String {
    let mut command = cargo_bin_cmd!("iatk");
    command.env("IATK_LOG_FILTER", "off").write_stdin(request);
    let output = command.assert().success().get_output().stdout.clone();
    String::from_utf8(output).expect("utf-8 stdout")
}

#[rstest]
#[case::not_json(
    "not json",
    r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"Parse error"}}"#
)]
#[case::not_a_request(
    r#"{"foo":"bar"}"#,
    r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"Parse error"}}"#
)]
#[case::unknown_method(
    r#"{"jsonrpc":"2.0","id":"42","method":"invalid-hello-world","params":{}}"#,
    r#"{"jsonrpc":"2.0","id":"42","error":{"code":-32601,"message":"Method not found"}}"#
)]
#[case::unknown_param(
    r#"{"jsonrpc":"2.0","id":"42","method":"get_physical_id","params":{"LogicalResourceId":"X","StackName":"Y","DoesntExist":[]}}"#,
    r#"{"jsonrpc":"2.0","id":"42","error":{"code":-32602,"message":"Invalid params"}}"#
)]
#[case::null_params(
    r#"{"jsonrpc":"2.0","id":"42","method":"get_physical_id","params":null}"#,
    r#"{"jsonrpc":"2.0","id":"42","error":{"code":10,"message":"missing required param \"StackName\""}}"#
)]
#[case::absent_params(
    r#"{"jsonrpc":"2.0","id":"42","method":"get_physical_id"}"#,
    r#"{"jsonrpc":"2.0","id":"42","error":{"code":-32602,"message":"Invalid params"}}"#
)]
#[case::reserved_tag(
    r#"{"jsonrpc":"2.0","id":"42","method":"test_harness.eventbridge.add_listener","params":{"EventBusName":"b","RuleName":"r","Tags":{"iatk:TestHarness:Created":"12345"}}}"#,
    r#"{"jsonrpc":"2.0","id":"42","error":{"code":10,"message":"invalid tags: reserved tag key \"iatk:TestHarness:Created\" found in provided tags"}}"#
)]
#[case::negative_message_count(
    r#"{"jsonrpc":"2.0","id":"42","method":"test_harness.eventbridge.poll_events","params":{"ListenerId":"iatk_eb_x","MaxNumberOfMessages":-200}}"#,
    r#"{"jsonrpc":"2.0","id":"42","error":{"code":10,"message":"\"MaxNumberOfMessages\" must be an integer between 1 and 10"}}"#
)]
#[case::overflowing_message_count(
    r#"{"jsonrpc":"2.0","id":"42","method":"test_harness.eventbridge.poll_events","params":{"ListenerId":"iatk_eb_x","MaxNumberOfMessages":90000000000}}"#,
    r#"{"jsonrpc":"2.0","id":"42","error":{"code":-32602,"message":"Invalid params"}}"#
)]
#[case::empty_tracing_header(
    r#"{"jsonrpc":"2.0","id":"42","method":"get_trace_tree","params":{"TracingHeader":""}}"#,
    r#"{"jsonrpc":"2.0","id":"42","error":{"code":10,"message":"missing required param \"TracingHeader\""}}"#
)]
#[case::empty_root(
    r#"{"jsonrpc":"2.0","id":"42","method":"get_trace_tree","params":{"TracingHeader":"Root=;"}}"#,
    r#"{"jsonrpc":"2.0","id":"42","error":{"code":10,"message":"error while getting trace_id from the tracing header: invalid tracing header provided"}}"#
)]
fn request_yields_exact_response_line(#[case] request: &str, #[case] expected: &str) {
    assert_eq!(response_for(request), format!("{expected}\n"));
}

#[test]
fn cloud_calls_report_the_missing_backend() {
    let response = response_for(
        r#"{"jsonrpc":"2.0","id":"9","method":"get_stack_outputs","params":{"StackName":"s","OutputNames":["A"]}}"#,
    );
    assert!(response.starts_with(
        r#"{"jsonrpc":"2.0","id":"9","error":{"code":10,"message":"error when loading AWS config: "#
    ));
}

#[test]
fn mock_event_from_schema_file_needs_no_backend() -> Result<()> {
    let mut schema = tempfile::Builder::new().suffix(".json").tempfile()?;
    schema
        .write_all(br#"{"type":"object","properties":{"source":{"type":"string"},"count":{"type":"integer"}}}"#)
        .context("write schema")?;
    let path = schema
        .path()
        .to_str()
        .ok_or_else(|| anyhow!("temporary path is not UTF-8"))?;
    let request = json!({
        "jsonrpc": "2.0",
        "id": "3",
        "method": "generate_mock_event",
        "params": {"SchemaFile": path, "Overrides": "{\"count\":7}"}
    });

    let response: Value = serde_json::from_str(&response_for(&request.to_string()))?;
    let encoded = response["result"]["output"]
        .as_str()
        .ok_or_else(|| anyhow!("output is not a string: {response}"))?;
    let event: Value = serde_json::from_str(encoded).context("decode event")?;

    ensure!(response["id"] == "3", "id not echoed: {response}");
    ensure!(
        event == json!({"source": "", "count": 7}),
        "unexpected event: {event}"
    );
    Ok(())
}

#[test]
fn rpc_specs_lists_every_method() {
    let mut command = cargo_bin_cmd!("iatk");
    command.arg("--rpc-specs");
    command
        .assert()
        .success()
        .stdout(contains("\"get_physical_id\""))
        .stdout(contains("\"test_harness.eventbridge.poll_events\""))
        .stdout(contains("\"mock.generate_barebone_event\""));
}

#[test]
fn unknown_flag_exits_with_failure() {
    let mut command = cargo_bin_cmd!("iatk");
    command.arg("--no-such-flag");
    command.assert().failure().stderr(contains("--no-such-flag"));
}
