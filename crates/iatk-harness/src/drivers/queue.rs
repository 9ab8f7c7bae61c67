//! Queue driver.

use std::collections::BTreeMap;

use iatk_cloud::sqs::{
    ATTRIBUTE_MESSAGE_RETENTION_PERIOD, ATTRIBUTE_POLICY, ATTRIBUTE_QUEUE_ARN, CreateQueueRequest,
    SqsApi,
};
use iatk_cloud::{Arn, CallContext};

use super::DriverError;
use crate::resource::{Resource, ResourceType};
use crate::tags::SystemTagKey;

const QUEUE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::drivers::queue");

/// Queue owned by a harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Queue {
    /// Queue name.
    pub name: String,
    /// Queue URL, the physical id.
    pub url: String,
    /// Queue ARN.
    pub arn: Arn,
}

impl Queue {
    /// Describes the queue as a [`Resource`].
    #[must_use]
    pub fn resource(&self) -> Resource {
        Resource::new(ResourceType::Queue, self.url.as_str(), self.arn.to_string())
    }
}

/// Attributes applied when creating a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueOptions {
    /// Access policy document.
    pub policy: String,
    /// Message retention in seconds.
    pub retention_seconds: u32,
}

/// Creates a queue carrying `tags` from the first call, then reads back its
/// ARN.
///
/// # Errors
///
/// Returns [`DriverError`] when creation fails, or
/// [`DriverError::QueueWithoutArn`] carrying the new queue's URL when only the
/// attribute read fails.
pub fn create(
    api: &dyn SqsApi,
    ctx: &CallContext,
    name: &str,
    tags: &BTreeMap<String, String>,
    options: &QueueOptions,
) -> Result<Queue, DriverError> {
    tracing::debug!(target: QUEUE_TARGET, queue = name, "creating queue");
    let mut attributes = BTreeMap::new();
    attributes.insert(
        ATTRIBUTE_MESSAGE_RETENTION_PERIOD.to_owned(),
        options.retention_seconds.to_string(),
    );
    attributes.insert(ATTRIBUTE_POLICY.to_owned(), options.policy.clone());
    let request = CreateQueueRequest {
        name: name.to_owned(),
        tags: tags.clone(),
        attributes,
    };
    let url = api
        .create_queue(ctx, &request)
        .map_err(|source| DriverError::call(format!("create queue \"{name}\" failed"), source))?;
    let arn = match read_arn(api, ctx, &url) {
        Ok(arn) => arn,
        Err(error) => {
            tracing::warn!(target: QUEUE_TARGET, queue = %url, %error, "created queue has no readable ARN");
            return Err(DriverError::QueueWithoutArn {
                url,
                source: Box::new(error),
            });
        }
    };
    tracing::debug!(target: QUEUE_TARGET, queue = %url, "created queue");
    Ok(Queue {
        name: name.to_owned(),
        url,
        arn,
    })
}

/// Deletes the queue at `url`.
///
/// # Errors
///
/// Returns [`DriverError`] when the call fails.
pub fn delete(api: &dyn SqsApi, ctx: &CallContext, url: &str) -> Result<(), DriverError> {
    tracing::debug!(target: QUEUE_TARGET, queue = url, "deleting queue");
    api.delete_queue(ctx, url)
        .map_err(|source| DriverError::call(format!("failed to delete queue \"{url}\""), source))?;
    tracing::debug!(target: QUEUE_TARGET, queue = url, "deleted queue");
    Ok(())
}

/// Looks up a queue by name: URL first, then ARN.
///
/// # Errors
///
/// Returns [`DriverError`] when the queue does not exist.
pub fn get_by_name(api: &dyn SqsApi, ctx: &CallContext, name: &str) -> Result<Queue, DriverError> {
    let url = api.get_queue_url(ctx, name).map_err(|source| {
        DriverError::call(format!("failed to get queue with name \"{name}\""), source)
    })?;
    let arn = read_arn(api, ctx, &url)?;
    Ok(Queue {
        name: name.to_owned(),
        url,
        arn,
    })
}

/// Reads the tags on the queue at `url`.
///
/// # Errors
///
/// Returns [`DriverError`] when the call fails.
pub fn tags_for_url(
    api: &dyn SqsApi,
    ctx: &CallContext,
    url: &str,
) -> Result<BTreeMap<String, String>, DriverError> {
    api.list_queue_tags(ctx, url).map_err(|source| {
        DriverError::call(format!("failed to list tags of queue \"{url}\""), source)
    })
}

/// Returns the name of the bus a harness queue targets.
///
/// The target tag stores the bus ARN; its `event-bus/<name>` resource is
/// reduced to the name, any other value is returned as stored.
///
/// # Errors
///
/// Returns [`DriverError::MissingTargetTag`] when the queue has no target
/// tag, or the tag read error.
pub fn event_bus_name_from_queue(
    api: &dyn SqsApi,
    ctx: &CallContext,
    url: &str,
) -> Result<String, DriverError> {
    let tags = tags_for_url(api, ctx, url)?;
    let target = tags
        .get(SystemTagKey::Target.as_str())
        .ok_or_else(|| DriverError::MissingTargetTag {
            url: url.to_owned(),
        })?;
    let name = target
        .parse::<Arn>()
        .ok()
        .and_then(|arn| {
            arn.resource
                .strip_prefix("event-bus/")
                .map(str::to_owned)
        })
        .unwrap_or_else(|| target.clone());
    Ok(name)
}

fn read_arn(api: &dyn SqsApi, ctx: &CallContext, url: &str) -> Result<Arn, DriverError> {
    let attributes = api
        .get_queue_attributes(ctx, url, &[ATTRIBUTE_QUEUE_ARN])
        .map_err(|source| {
            DriverError::call(format!("failed to get attributes of queue \"{url}\""), source)
        })?;
    let raw = attributes
        .get(ATTRIBUTE_QUEUE_ARN)
        .ok_or_else(|| DriverError::MissingQueueArn {
            url: url.to_owned(),
        })?;
    raw.parse().map_err(|source| {
        DriverError::invalid_arn(format!("queue \"{url}\" reported an invalid ARN"), source)
    })
}
