//! Client metadata and the user-agent value derived from it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

const METADATA_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::metadata");

/// Product key the user-agent value is recorded under.
pub const USER_AGENT_KEY: &str = "aws-iatk";

/// User-agent value used when metadata is absent or fails validation.
pub const UNKNOWN_USER_AGENT: &str = "unknown";

const SUPPORTED_CLIENTS: [&str; 1] = ["python"];

// MAJOR.MINOR.PATCH with optional build metadata; pre-release tags are refused.
static VERSION_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:\+[0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*)?$",
    )
    .ok()
});

static CALLER_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_.]{1,99}$").ok());

/// Information a client library attaches to a request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Metadata {
    /// Client library name, for example `python`.
    #[serde(default)]
    pub client: String,
    /// Version of the client library.
    #[serde(default)]
    pub version: String,
    /// Public client method that issued the request.
    #[serde(default)]
    pub caller: String,
    /// Version of the client language runtime.
    #[serde(default)]
    pub client_version: String,
    /// Key the client uses to recognise repeated calls.
    #[serde(default)]
    pub dedup_key: String,
}

impl Metadata {
    /// Returns the user-agent value describing this client:
    /// `<client>#<client_version>#<version>#<caller>`.
    ///
    /// Any unsupported client, malformed version or malformed caller
    /// collapses the value to [`UNKNOWN_USER_AGENT`].
    #[must_use]
    pub fn user_agent_value(&self) -> String {
        let client = self.client.to_lowercase();
        if !SUPPORTED_CLIENTS.contains(&client.as_str()) {
            tracing::debug!(target: METADATA_TARGET, client = %client, "unrecognised client");
            return UNKNOWN_USER_AGENT.to_owned();
        }
        if !matches_pattern(&VERSION_PATTERN, &self.version) {
            tracing::debug!(target: METADATA_TARGET, version = %self.version, "invalid version");
            return UNKNOWN_USER_AGENT.to_owned();
        }
        if !matches_pattern(&CALLER_PATTERN, &self.caller) {
            tracing::debug!(target: METADATA_TARGET, caller = %self.caller, "invalid caller");
            return UNKNOWN_USER_AGENT.to_owned();
        }
        format!(
            "{client}#{}#{}#{}",
            self.client_version, self.version, self.caller
        )
    }

    /// Returns the full user agent for optional metadata:
    /// `aws-iatk/<value>`.
    #[must_use]
    pub fn user_agent(metadata: Option<&Self>) -> String {
        let value = metadata.map_or_else(|| UNKNOWN_USER_AGENT.to_owned(), Self::user_agent_value);
        format!("{USER_AGENT_KEY}/{value}")
    }
}

fn matches_pattern(pattern: &Lazy<Option<Regex>>, text: &str) -> bool {
    pattern.as_ref().is_some_and(|regex| regex.is_match(text))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn metadata(client: &str, version: &str, caller: &str) -> Metadata {
        Metadata {
            client: client.to_owned(),
            version: version.to_owned(),
            caller: caller.to_owned(),
            client_version: "3.11.2".to_owned(),
            dedup_key: String::new(),
        }
    }

    #[rstest]
    #[case("python", "0.0.3", "get_trace_tree", "python#3.11.2#0.0.3#get_trace_tree")]
    #[case("PYTHON", "1.2.3+build.7", "Iatk.poll_events", "python#3.11.2#1.2.3+build.7#Iatk.poll_events")]
    #[case("java", "0.0.3", "get_trace_tree", "unknown")]
    #[case("", "0.0.3", "get_trace_tree", "unknown")]
    #[case("python", "1.2.3-beta.1", "get_trace_tree", "unknown")]
    #[case("python", "01.2.3", "get_trace_tree", "unknown")]
    #[case("python", "1.2", "get_trace_tree", "unknown")]
    #[case("python", "0.0.3", "9starts_with_digit", "unknown")]
    #[case("python", "0.0.3", "x", "unknown")]
    #[case("python", "0.0.3", "has-dash", "unknown")]
    #[case("python", "0.0.3", "has#hash", "unknown")]
    fn user_agent_value_validates_every_part(
        #[case] client: &str,
        #[case] version: &str,
        #[case] caller: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(metadata(client, version, caller).user_agent_value(), expected);
    }

    #[rstest]
    fn caller_length_is_bounded() {
        let long_caller = "a".repeat(101);
        let longest_caller = "a".repeat(100);
        assert_eq!(
            metadata("python", "0.0.1", &long_caller).user_agent_value(),
            UNKNOWN_USER_AGENT
        );
        assert_ne!(
            metadata("python", "0.0.1", &longest_caller).user_agent_value(),
            UNKNOWN_USER_AGENT
        );
    }

    #[rstest]
    fn user_agent_is_prefixed_with_product_key() {
        assert_eq!(Metadata::user_agent(None), "aws-iatk/unknown");
        assert_eq!(
            Metadata::user_agent(Some(&metadata("python", "0.1.0", "caller"))),
            "aws-iatk/python#3.11.2#0.1.0#caller"
        );
    }
}
