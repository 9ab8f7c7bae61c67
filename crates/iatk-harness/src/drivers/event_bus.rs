//! Event-bus driver.

use iatk_cloud::eventbridge::EventBridgeApi;
use iatk_cloud::{Arn, CallContext};

use super::DriverError;
use crate::resource::{Resource, ResourceType};

/// Resolved event bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBus {
    /// Bus name.
    pub name: String,
    /// Bus ARN.
    pub arn: Arn,
}

impl EventBus {
    /// Describes the bus as a [`Resource`].
    #[must_use]
    pub fn resource(&self) -> Resource {
        Resource::new(ResourceType::EventBus, self.name.as_str(), self.arn.to_string())
    }
}

/// Resolves the named bus and its ARN.
///
/// # Errors
///
/// Returns [`DriverError`] when the bus does not exist.
pub fn get(api: &dyn EventBridgeApi, ctx: &CallContext, name: &str) -> Result<EventBus, DriverError> {
    let context = || format!("cannot get event bus \"{name}\"");
    let description = api
        .describe_event_bus(ctx, name)
        .map_err(|source| DriverError::call(context(), source))?;
    let arn = description
        .arn
        .parse()
        .map_err(|source| DriverError::invalid_arn(context(), source))?;
    Ok(EventBus {
        name: name.to_owned(),
        arn,
    })
}
