//! Client bundles and the provider seam that builds them.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::cloudformation::CloudFormationApi;
use crate::eventbridge::EventBridgeApi;
use crate::schemas::SchemasApi;
use crate::sqs::SqsApi;
use crate::tagging::TaggingApi;
use crate::xray::XRayApi;

const PROVIDER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::provider");

/// Settings used to configure a client bundle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientSettings {
    /// Region override; `None` defers to the provider's default chain.
    pub region: Option<String>,
    /// Named credential profile.
    pub profile: Option<String>,
    /// Value appended to the outgoing user agent.
    pub user_agent: String,
}

/// Clients for every service the toolkit calls.
#[derive(Clone)]
pub struct CloudClients {
    /// EventBridge client.
    pub eventbridge: Arc<dyn EventBridgeApi>,
    /// SQS client.
    pub sqs: Arc<dyn SqsApi>,
    /// Resource Groups Tagging client.
    pub tagging: Arc<dyn TaggingApi>,
    /// CloudFormation client.
    pub cloudformation: Arc<dyn CloudFormationApi>,
    /// X-Ray client.
    pub xray: Arc<dyn XRayApi>,
    /// Schema registry client.
    pub schemas: Arc<dyn SchemasApi>,
}

impl fmt::Debug for CloudClients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudClients").finish_non_exhaustive()
    }
}

/// Errors raised while building a client bundle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// No cloud backend is available to this process.
    #[error("cloud backend unavailable: {message}")]
    Unavailable {
        /// Reason the backend cannot be used.
        message: String,
    },
    /// The requested region or profile could not be resolved.
    #[error("failed to load configuration for profile '{profile}': {message}")]
    Configuration {
        /// Profile that failed to load.
        profile: String,
        /// Underlying failure.
        message: String,
    },
}

/// Builds client bundles for a region, profile and user agent.
pub trait CloudProvider: Send + Sync {
    /// Returns clients configured with `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when no usable clients can be built.
    fn clients(&self, settings: &ClientSettings) -> Result<CloudClients, ProviderError>;
}

/// Provider used when no cloud transport is linked into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableProvider;

impl CloudProvider for UnavailableProvider {
    fn clients(&self, settings: &ClientSettings) -> Result<CloudClients, ProviderError> {
        tracing::warn!(
            target: PROVIDER_TARGET,
            region = settings.region.as_deref().unwrap_or_default(),
            profile = settings.profile.as_deref().unwrap_or_default(),
            "cloud clients requested but no transport is linked"
        );
        Err(ProviderError::Unavailable {
            message: "no cloud transport is linked into this build".to_owned(),
        })
    }
}
