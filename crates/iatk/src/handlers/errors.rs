//! Errors returned by method handlers.
//!
//! The `Display` text of every variant except [`MethodError::Encode`] is the
//! message sent back to the caller under error code 10.

use iatk_cloud::{ApiError, ProviderError};
use iatk_harness::{ListenerError, TagError};
use iatk_mock_event::{GenerateError, OverrideError, SchemaError};
use iatk_xray::{HeaderError, TreeError};
use thiserror::Error;

/// Failure of one method call.
#[derive(Debug, Error)]
pub enum MethodError {
    /// A required parameter is blank.
    #[error("missing required param \"{name}\"")]
    MissingParam {
        /// Wire name of the parameter.
        name: &'static str,
    },
    /// Parameters are individually valid but do not make sense together, or
    /// a value is out of range.
    #[error("{message}")]
    InvalidParams {
        /// Validation message.
        message: String,
    },
    /// Cloud clients could not be built.
    #[error("error when loading AWS config: {source}")]
    Provider {
        /// Provider failure.
        #[source]
        source: ProviderError,
    },
    /// A cloud call failed.
    #[error(transparent)]
    Cloud(#[from] ApiError),
    /// Some requested stack outputs do not exist.
    #[error("Not all output keys found")]
    MissingOutputs,
    /// Caller tags use the reserved vocabulary.
    #[error("invalid tags: {source}")]
    Tags {
        /// Validation failure.
        #[source]
        source: TagError,
    },
    /// The bus, rule or target under test could not be resolved.
    #[error("failed to locate test target: {source}")]
    LocateTarget {
        /// Listener failure.
        #[source]
        source: ListenerError,
    },
    /// An existing listener could not be read back.
    #[error("error retrieving listener info: {source}")]
    RetrieveListener {
        /// Listener failure.
        #[source]
        source: ListenerError,
    },
    /// Receiving or acknowledging captured events failed.
    #[error("error polling events: {source}")]
    PollEvents {
        /// Listener failure.
        #[source]
        source: ListenerError,
    },
    /// Creating or destroying listeners failed.
    #[error(transparent)]
    Listener(#[from] ListenerError),
    /// The tracing header holds no usable trace id.
    #[error("error while getting trace_id from the tracing header: {source}")]
    TracingHeader {
        /// Header failure.
        #[source]
        source: HeaderError,
    },
    /// The trace tree could not be built.
    #[error("error building trace tree: {source}")]
    TraceTree {
        /// Tree failure.
        #[source]
        source: Box<TreeError>,
    },
    /// The schema could not be loaded.
    #[error("error reading schema: {source}")]
    Schema {
        /// Schema failure.
        #[source]
        source: SchemaError,
    },
    /// No event could be generated from the schema.
    #[error("error generating mock event: {source}")]
    Generate {
        /// Generator failure.
        #[source]
        source: GenerateError,
    },
    /// Overrides could not be applied to the generated event.
    #[error("error generating mock event: {source}")]
    Overrides {
        /// Override failure.
        #[source]
        source: OverrideError,
    },
    /// The handler result could not be serialised.
    #[error("failed to encode output: {source}")]
    Encode {
        /// Encoder failure.
        #[source]
        source: serde_json::Error,
    },
}

impl MethodError {
    /// Creates a missing-parameter error.
    #[must_use]
    pub const fn missing(name: &'static str) -> Self {
        Self::MissingParam { name }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Returns `true` when the failure is internal rather than caused by the
    /// request or the cloud.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Encode { .. })
    }
}
