//! Caller-supplied overrides for generated events.

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while applying overrides.
#[derive(Debug, Error)]
pub enum OverrideError {
    /// The event is not a JSON object.
    #[error("invalid event: can not decode: {message}")]
    Event {
        /// Decoder message.
        message: String,
    },
    /// The overrides are not a JSON object.
    #[error("invalid overrides: can not decode: {message}")]
    Overrides {
        /// Decoder message.
        message: String,
    },
    /// The result could not be encoded.
    #[error("cannot encode event into json: {source}")]
    Encode {
        /// Encoder error.
        #[source]
        source: serde_json::Error,
    },
}

/// Applies `overrides` (a JSON object) to `event` (a JSON object) and returns
/// the re-encoded event.
///
/// Each override key replaces the first matching key met while walking the
/// event depth first, looking inside nested objects and arrays. A replaced
/// value is not searched further. Keys that match nothing are added at the
/// top level.
///
/// # Errors
///
/// Returns [`OverrideError`] when either input is not a JSON object.
///
/// # Examples
///
/// ```
/// use iatk_mock_event::apply_overrides;
///
/// let event = apply_overrides(r#"{"detail":{"id":""}}"#, r#"{"id":"42","extra":true}"#)
///     .expect("overridden");
/// assert_eq!(event, r#"{"detail":{"id":"42"},"extra":true}"#);
/// ```
pub fn apply_overrides(event: &str, overrides: &str) -> Result<String, OverrideError> {
    let mut event_map = decode_object(event).map_err(|message| OverrideError::Event { message })?;
    let mut remaining =
        decode_object(overrides).map_err(|message| OverrideError::Overrides { message })?;
    override_object(&mut event_map, &mut remaining);
    event_map.extend(remaining);
    serde_json::to_string(&event_map).map_err(|source| OverrideError::Encode { source })
}

fn decode_object(text: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("expected a JSON object".to_owned()),
        Err(error) => Err(error.to_string()),
    }
}

fn override_object(event: &mut Map<String, Value>, remaining: &mut Map<String, Value>) {
    for (key, element) in event.iter_mut() {
        if remaining.is_empty() {
            return;
        }
        if let Some(replacement) = remaining.remove(key) {
            *element = replacement;
        } else {
            override_value(element, remaining);
        }
    }
}

fn override_value(element: &mut Value, remaining: &mut Map<String, Value>) {
    match element {
        Value::Object(map) => override_object(map, remaining),
        Value::Array(items) => {
            for item in items {
                override_value(item, remaining);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn apply(event: &Value, overrides: &Value) -> Value {
        let text = apply_overrides(&event.to_string(), &overrides.to_string()).expect("apply");
        serde_json::from_str(&text).expect("json")
    }

    #[rstest]
    #[case(json!({"test": "before"}), json!({"test": "after"}), json!({"test": "after"}))]
    #[case(json!({"test": {"inner": "before"}}), json!({"test": "after"}), json!({"test": "after"}))]
    #[case(json!({}), json!({"a": 1, "b": 2}), json!({"a": 1, "b": 2}))]
    #[case(json!({"outer": {"test": "before"}}), json!({"test": "after"}), json!({"outer": {"test": "after"}}))]
    #[case(json!({"list": [{"test": "before"}]}), json!({"test": "after"}), json!({"list": [{"test": "after"}]}))]
    fn overrides_matching_keys(#[case] event: Value, #[case] overrides: Value, #[case] expected: Value) {
        assert_eq!(apply(&event, &overrides), expected);
    }

    #[test]
    fn first_match_wins() {
        let event = json!({"a": {"id": "x"}, "b": {"id": "y"}});
        assert_eq!(
            apply(&event, &json!({"id": "z"})),
            json!({"a": {"id": "z"}, "b": {"id": "y"}})
        );
    }

    #[rstest]
    #[case("[]", "{}", "invalid event: can not decode: expected a JSON object")]
    #[case("{}", "42", "invalid overrides: can not decode: expected a JSON object")]
    fn rejects_non_objects(#[case] event: &str, #[case] overrides: &str, #[case] message: &str) {
        let error = apply_overrides(event, overrides).expect_err("must fail");
        assert_eq!(error.to_string(), message);
    }

    #[test]
    fn reports_malformed_overrides() {
        let error = apply_overrides("{}", "{not json").expect_err("must fail");
        assert!(error.to_string().starts_with("invalid overrides: can not decode: "));
    }
}
