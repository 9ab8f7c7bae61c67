//! Listener engine errors.

use std::fmt;

use iatk_cloud::ApiError;
use thiserror::Error;

use super::id::InvalidListenerId;
use crate::drivers::DriverError;

/// Errors raised by the listener lifecycle engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListenerError {
    /// Externally supplied id is malformed.
    #[error(transparent)]
    InvalidId(#[from] InvalidListenerId),
    /// The target bus could not be resolved.
    #[error("failed to resolve event bus \"{event_bus}\": {source}")]
    EventBus {
        /// Requested bus.
        event_bus: String,
        /// Driver failure.
        #[source]
        source: Box<DriverError>,
    },
    /// The source rule could not be resolved.
    #[error("RuleName \"{rule}\" was provided but not found for eventbus \"{event_bus}\": {source}")]
    SourceRule {
        /// Requested rule.
        rule: String,
        /// Bus searched.
        event_bus: String,
        /// Driver failure.
        #[source]
        source: Box<DriverError>,
    },
    /// The source target could not be resolved.
    #[error("failed to resolve target \"{target_id}\" of rule \"{rule}\": {source}")]
    SourceTarget {
        /// Requested target id.
        target_id: String,
        /// Rule searched.
        rule: String,
        /// Driver failure.
        #[source]
        source: Box<DriverError>,
    },
    /// A deploy step failed.
    #[error("failed to deploy eb listener {id}: {source}")]
    Deploy {
        /// Listener id.
        id: String,
        /// Driver failure.
        #[source]
        source: Box<DriverError>,
    },
    /// Deploy requires the target bus resolved by preflight.
    #[error("eb listener {id} has no resolved event bus")]
    MissingEventBus {
        /// Listener id.
        id: String,
    },
    /// Creation failed and was rolled back.
    #[error("failed to create eb listener {id}: {source}{}", leaked_note(.leaked))]
    Create {
        /// Listener id.
        id: String,
        /// First failure.
        #[source]
        source: Box<ListenerError>,
        /// ARNs left behind because rollback failed.
        leaked: Vec<String>,
    },
    /// Reading the listener back failed.
    #[error("failed to get eb listener {id}: {source}")]
    Get {
        /// Listener id.
        id: String,
        /// Driver failure.
        #[source]
        source: Box<DriverError>,
    },
    /// Tearing the listener down failed.
    #[error("failed to destroy eb listener {id}: {source}")]
    Destroy {
        /// Listener id.
        id: String,
        /// Driver failure.
        #[source]
        source: Box<DriverError>,
    },
    /// Some listeners of a bulk destroy failed.
    #[error("failed to destroy following listener(s): {}", join_failures(.failures))]
    DestroyMultiple {
        /// One entry per failed listener.
        failures: Vec<DestroyFailure>,
    },
    /// Tag filters could not be resolved to listener ids.
    #[error("failed to find listeners with tag filters: {source}")]
    TagFilters {
        /// Driver failure.
        #[source]
        source: Box<DriverError>,
    },
    /// The listener has no queue to poll.
    #[error("eb listener {id} has no queue")]
    NoQueue {
        /// Listener id.
        id: String,
    },
    /// Receiving messages failed.
    #[error("failed to poll events: failed to receive events: {source}")]
    ReceiveEvents {
        /// Provider failure.
        #[source]
        source: ApiError,
    },
    /// Acknowledging received messages failed.
    #[error("failed to poll events: failed to delete events: {source}")]
    DeleteEvents {
        /// Provider failure.
        #[source]
        source: ApiError,
    },
}

/// One failed listener of a bulk destroy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestroyFailure {
    /// Listener id as supplied.
    pub id: String,
    /// Failure message.
    pub reason: String,
}

impl fmt::Display for DestroyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{resource group id: {}, reason: {}}}", self.id, self.reason)
    }
}

fn join_failures(failures: &[DestroyFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn leaked_note(leaked: &[String]) -> String {
    if leaked.is_empty() {
        String::new()
    } else {
        format!(
            "; rollback failed, please manually delete following resources: {}",
            leaked.join(", ")
        )
    }
}
