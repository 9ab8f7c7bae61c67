//! Method handlers.
//!
//! Each handler validates its parameters, asks the [`HandlerContext`] for
//! cloud clients configured with the request's region, profile and user
//! agent, calls the engine or driver that does the work, and returns the
//! value placed under `result.output`.

pub mod cloudformation;
mod errors;
pub mod listener;
pub mod mock_event;
pub mod trace_tree;

use iatk_cloud::{CallContext, ClientSettings, CloudClients, CloudProvider};
use iatk_config::Config;
use serde::Serialize;
use serde_json::Value;

pub use errors::MethodError;

use crate::jsonrpc::Metadata;

pub(crate) const HANDLER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::handlers");

/// Everything a handler needs besides its parameters.
pub struct HandlerContext<'a> {
    provider: &'a dyn CloudProvider,
    config: &'a Config,
    user_agent: String,
    call: CallContext,
}

impl std::fmt::Debug for HandlerContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerContext")
            .field("config", &self.config)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl<'a> HandlerContext<'a> {
    /// Creates a context whose clients carry the user agent derived from
    /// `metadata`.
    #[must_use]
    pub fn new(
        provider: &'a dyn CloudProvider,
        config: &'a Config,
        metadata: Option<&Metadata>,
    ) -> Self {
        Self {
            provider,
            config,
            user_agent: Metadata::user_agent(metadata),
            call: CallContext::new(),
        }
    }

    /// Replaces the call context threaded through every cloud call.
    #[must_use]
    pub fn with_call_context(mut self, call: CallContext) -> Self {
        self.call = call;
        self
    }

    /// Call context for cloud calls.
    #[must_use]
    pub const fn call(&self) -> &CallContext {
        &self.call
    }

    /// User agent stamped on every client.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Builds cloud clients for the requested region and profile, falling
    /// back to the configured defaults for blank values.
    ///
    /// # Errors
    ///
    /// Returns [`MethodError::Provider`] when the provider cannot build
    /// clients.
    pub fn clients(
        &self,
        region: Option<&str>,
        profile: Option<&str>,
    ) -> Result<CloudClients, MethodError> {
        let settings = ClientSettings {
            region: self.config.region_or_default(region),
            profile: self.config.profile_or_default(profile),
            user_agent: self.user_agent.clone(),
        };
        tracing::debug!(
            target: HANDLER_TARGET,
            region = settings.region.as_deref().unwrap_or_default(),
            profile = settings.profile.as_deref().unwrap_or_default(),
            user_agent = %settings.user_agent,
            "building cloud clients"
        );
        self.provider
            .clients(&settings)
            .map_err(|source| MethodError::Provider { source })
    }
}

/// Serialises a handler result into the `output` value.
pub(crate) fn output<T: Serialize>(value: &T) -> Result<Value, MethodError> {
    serde_json::to_value(value).map_err(|source| MethodError::Encode { source })
}

/// Rejects blank required parameters.
pub(crate) fn require(value: &str, name: &'static str) -> Result<(), MethodError> {
    if value.is_empty() {
        return Err(MethodError::missing(name));
    }
    Ok(())
}
