//! Drivers over one cloud resource kind each.
//!
//! Every driver call wraps the provider error with a sentence naming the
//! operation and the resource it touched.

pub mod event_bus;
pub mod queue;
pub mod rule;
pub mod tagging;

use iatk_cloud::{ApiError, ArnParseError};
use thiserror::Error;

/// Errors raised by resource drivers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// A cloud call failed.
    #[error("{context}: {source}")]
    Call {
        /// Sentence naming the operation and resource.
        context: String,
        /// Provider error.
        #[source]
        source: ApiError,
    },
    /// The service returned an ARN that could not be parsed.
    #[error("{context}: {source}")]
    InvalidArn {
        /// Sentence naming the resource.
        context: String,
        /// Parse failure.
        #[source]
        source: ArnParseError,
    },
    /// The queue was created but reading it back failed; the queue exists at
    /// `url`.
    #[error("{source}")]
    QueueWithoutArn {
        /// URL of the created queue.
        url: String,
        /// Read-back failure.
        #[source]
        source: Box<DriverError>,
    },
    /// The queue attributes did not include its ARN.
    #[error("queue \"{url}\" did not report its ARN")]
    MissingQueueArn {
        /// Queue URL.
        url: String,
    },
    /// The queue carries no harness target tag.
    #[error("cannot get event bus name from queue \"{url}\"")]
    MissingTargetTag {
        /// Queue URL.
        url: String,
    },
    /// The requested target is not attached to the rule.
    #[error("target \"{target_id}\" not found on rule \"{rule}\" of event bus \"{event_bus}\"")]
    TargetNotFound {
        /// Requested target id.
        target_id: String,
        /// Rule searched.
        rule: String,
        /// Bus owning the rule.
        event_bus: String,
    },
    /// More than one input shaping option was set on a target.
    #[error("input, inputPath, and inputTransformer are mutually exclusive")]
    ConflictingInput,
    /// No resource carries the requested harness id.
    #[error("no resource found for Test Harness {id}")]
    NoHarnessResources {
        /// Harness id searched.
        id: String,
    },
    /// Resources of one harness disagree on their target.
    #[error("found multiple targets for Test Harness {id}: {targets:?}")]
    MultipleTargets {
        /// Harness id searched.
        id: String,
        /// Distinct target values found.
        targets: Vec<String>,
    },
    /// Resources of one harness carry no target tag.
    #[error("found zero target for Test Harness {id}")]
    NoTarget {
        /// Harness id searched.
        id: String,
    },
}

impl DriverError {
    /// Wraps a provider error with a sentence describing the failed step.
    #[must_use]
    pub fn call(context: impl Into<String>, source: ApiError) -> Self {
        Self::Call {
            context: context.into(),
            source,
        }
    }

    /// Wraps an ARN parse failure.
    #[must_use]
    pub fn invalid_arn(context: impl Into<String>, source: ArnParseError) -> Self {
        Self::InvalidArn {
            context: context.into(),
            source,
        }
    }

    /// URL of a queue this failure left behind, if any.
    #[must_use]
    pub fn created_queue_url(&self) -> Option<&str> {
        match self {
            Self::QueueWithoutArn { url, .. } => Some(url.as_str()),
            _ => None,
        }
    }

    /// Returns the provider error when this error wraps one.
    #[must_use]
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Call { source, .. } => Some(source),
            Self::QueueWithoutArn { source, .. } => source.api_error(),
            _ => None,
        }
    }
}
