//! Event-bus listener lifecycle engine.
//!
//! A listener captures the events matched by an existing rule. Deploying one
//! creates a derived rule with the same pattern on the same bus, a queue the
//! derived rule alone may write to, and the binding between the two. All
//! three carry the reserved tag set so listeners can be found again by id or
//! by tag filter.

mod bulk;
mod error;
mod id;
mod policy;

use std::collections::BTreeMap;
use std::sync::Arc;

use iatk_cloud::eventbridge::{EventBridgeApi, Target};
use iatk_cloud::sqs::{DeleteMessageBatchEntry, ReceiveMessageRequest, SqsApi};
use iatk_cloud::{CallContext, CloudClients};
use serde::Serialize;
use time::OffsetDateTime;

pub use bulk::{DestroyOptions, destroy_multiple, destroy_with_tag_filters};
pub use error::{DestroyFailure, ListenerError};
pub use id::{ID_PREFIX, InvalidListenerId, ListenerId, SUFFIX_LEN, is_valid_id};
pub use policy::QueuePolicy;

use crate::drivers::DriverError;
use crate::drivers::event_bus::{self, EventBus};
use crate::drivers::queue::{self, Queue, QueueOptions};
use crate::drivers::rule::{self, Rule};
use crate::resource::Resource;
use crate::tags::system_tags;

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::listener");

/// Harness type recorded in the `Type` tag.
pub const TEST_HARNESS_TYPE: &str = "EventBridge.Listener";

/// Retention of captured events.
pub const QUEUE_RETENTION_SECONDS: u32 = 3600;

/// Seconds added to the long-poll wait to form the visibility timeout.
pub const VISIBILITY_GRACE_SECONDS: i32 = 5;

/// Clients a listener needs.
#[derive(Clone)]
pub struct ListenerClients {
    /// EventBridge client.
    pub eventbridge: Arc<dyn EventBridgeApi>,
    /// SQS client.
    pub sqs: Arc<dyn SqsApi>,
}

impl std::fmt::Debug for ListenerClients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerClients").finish_non_exhaustive()
    }
}

impl From<&CloudClients> for ListenerClients {
    fn from(clients: &CloudClients) -> Self {
        Self {
            eventbridge: Arc::clone(&clients.eventbridge),
            sqs: Arc::clone(&clients.sqs),
        }
    }
}

/// Inputs to [`Listener::new`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListenerSpec {
    /// Bus carrying the rule under test.
    pub event_bus_name: String,
    /// Rule whose pattern the listener copies.
    pub rule_name: String,
    /// Target of the rule whose input shaping is copied; empty for none.
    pub target_id: String,
    /// Caller tags, already validated against the reserved vocabulary.
    pub tags: BTreeMap<String, String>,
}

/// Result of a successful create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListenerOutput {
    /// Listener id.
    #[serde(rename = "Id")]
    pub id: String,
    /// Bus the listener observes.
    #[serde(rename = "TargetUnderTest")]
    pub target_under_test: Resource,
    /// Queue then rule.
    #[serde(rename = "Components")]
    pub components: Vec<Resource>,
}

/// One event-bus listener.
#[derive(Debug, Clone)]
pub struct Listener {
    id: ListenerId,
    event_bus: Option<EventBus>,
    event_pattern: String,
    source_target: Option<Target>,
    user_tags: BTreeMap<String, String>,
    queue: Option<Queue>,
    rule: Option<Rule>,
    clients: ListenerClients,
}

impl Listener {
    /// Plans a listener: resolves the bus, the source rule and, when
    /// requested, the source target. Nothing is created.
    ///
    /// # Errors
    ///
    /// Returns a [`ListenerError`] naming the input that could not be found.
    pub fn new(
        clients: ListenerClients,
        ctx: &CallContext,
        spec: &ListenerSpec,
    ) -> Result<Self, ListenerError> {
        let bus = event_bus::get(clients.eventbridge.as_ref(), ctx, &spec.event_bus_name)
            .map_err(|source| ListenerError::EventBus {
                event_bus: spec.event_bus_name.clone(),
                source: Box::new(source),
            })?;
        let source_rule = rule::get(
            clients.eventbridge.as_ref(),
            ctx,
            &spec.rule_name,
            &spec.event_bus_name,
        )
        .map_err(|source| ListenerError::SourceRule {
            rule: spec.rule_name.clone(),
            event_bus: spec.event_bus_name.clone(),
            source: Box::new(source),
        })?;
        let source_target = rule::list_targets_by_rule(
            clients.eventbridge.as_ref(),
            ctx,
            &spec.target_id,
            &spec.rule_name,
            &spec.event_bus_name,
        )
        .map_err(|source| ListenerError::SourceTarget {
            target_id: spec.target_id.clone(),
            rule: spec.rule_name.clone(),
            source: Box::new(source),
        })?;

        Ok(Self {
            id: ListenerId::generate(),
            event_bus: Some(bus),
            event_pattern: source_rule.event_pattern,
            source_target,
            user_tags: spec.tags.clone(),
            queue: None,
            rule: None,
            clients,
        })
    }

    /// Reads an existing listener back by id.
    ///
    /// The rule is looked up best effort: when it cannot be found the
    /// listener carries only its queue, which is enough to destroy it.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::InvalidId`] without any call when
    /// `candidate` is malformed, or [`ListenerError::Get`] when the queue cannot be read.
    pub fn get(
        clients: ListenerClients,
        ctx: &CallContext,
        candidate: &str,
    ) -> Result<Self, ListenerError> {
        let id = ListenerId::parse(candidate)?;
        let found_queue = queue::get_by_name(clients.sqs.as_ref(), ctx, id.as_str())
            .map_err(|source| {
                tracing::warn!(
                    target: LISTENER_TARGET,
                    listener = %id,
                    error = %source,
                    "cannot locate queue of listener"
                );
                ListenerError::Get {
                    id: id.to_string(),
                    source: Box::new(source),
                }
            })?;

        let found_rule = match queue::event_bus_name_from_queue(
            clients.sqs.as_ref(),
            ctx,
            &found_queue.url,
        ) {
            Ok(bus) => rule::get(clients.eventbridge.as_ref(), ctx, id.as_str(), &bus)
                .inspect_err(|error| {
                    tracing::warn!(
                        target: LISTENER_TARGET,
                        listener = %id,
                        %error,
                        "cannot locate rule of listener; only the queue will be destroyed"
                    );
                })
                .ok(),
            Err(error) => {
                tracing::warn!(
                    target: LISTENER_TARGET,
                    listener = %id,
                    %error,
                    "unable to find event bus of listener"
                );
                None
            }
        };

        Ok(Self {
            id,
            event_bus: None,
            event_pattern: String::new(),
            source_target: None,
            user_tags: BTreeMap::new(),
            queue: Some(found_queue),
            rule: found_rule,
            clients,
        })
    }

    /// Listener id.
    #[must_use]
    pub const fn id(&self) -> &ListenerId {
        &self.id
    }

    /// Queue, once created or found.
    #[must_use]
    pub const fn queue(&self) -> Option<&Queue> {
        self.queue.as_ref()
    }

    /// Derived rule, once created or found.
    #[must_use]
    pub const fn rule(&self) -> Option<&Rule> {
        self.rule.as_ref()
    }

    /// Owned resources that currently exist, queue first.
    #[must_use]
    pub fn components(&self) -> Vec<Resource> {
        self.queue
            .iter()
            .map(Queue::resource)
            .chain(self.rule.iter().map(Rule::resource))
            .collect()
    }

    /// Creates the derived rule, the queue and the binding, in that order.
    ///
    /// Resources created before a failure are kept on `self` so
    /// [`destroy`](Self::destroy) can remove them.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Deploy`] wrapping the failed step.
    pub fn deploy(&mut self, ctx: &CallContext) -> Result<(), ListenerError> {
        let id = self.id.to_string();
        let bus = self
            .event_bus
            .clone()
            .ok_or_else(|| ListenerError::MissingEventBus { id: id.clone() })?;
        tracing::info!(target: LISTENER_TARGET, listener = %id, "deploying listener");
        let deploy_error = |source: DriverError| ListenerError::Deploy {
            id: id.clone(),
            source: Box::new(source),
        };

        let tags = system_tags(
            &id,
            TEST_HARNESS_TYPE,
            &bus.arn.to_string(),
            OffsetDateTime::now_utc(),
            &self.user_tags,
        );
        let description = format!("rule for Listener \"{id}\"; created by iatk");
        let created_rule = rule::create(
            self.clients.eventbridge.as_ref(),
            ctx,
            &id,
            &bus.name,
            &self.event_pattern,
            &description,
            &tags,
        )
        .map_err(deploy_error)?;
        let policy = QueuePolicy {
            queue_arn: QueuePolicy::predicted_queue_arn(&bus.arn, &id),
            rule_arn: created_rule.arn.clone(),
        };
        self.rule = Some(created_rule);

        let options = QueueOptions {
            policy: policy.to_string(),
            retention_seconds: QUEUE_RETENTION_SECONDS,
        };
        match queue::create(self.clients.sqs.as_ref(), ctx, &id, &tags, &options) {
            Ok(created_queue) => self.queue = Some(created_queue),
            Err(error) => {
                // Keep the half-created queue so rollback deletes it; its ARN
                // is the one the policy was written for.
                if let Some(url) = error.created_queue_url() {
                    self.queue = Some(Queue {
                        name: id.clone(),
                        url: url.to_owned(),
                        arn: policy.queue_arn.clone(),
                    });
                }
                return Err(deploy_error(error));
            }
        }

        if let (Some(created_queue), Some(created_rule)) = (&self.queue, &self.rule) {
            rule::put_queue_target(
                self.clients.eventbridge.as_ref(),
                ctx,
                &id,
                created_queue,
                created_rule,
                self.source_target.as_ref(),
            )
            .map_err(deploy_error)?;
        }
        tracing::info!(target: LISTENER_TARGET, listener = %id, "deployed listener");
        Ok(())
    }

    /// Deploys the listener, destroying whatever was created when any step
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Create`] carrying the deploy failure and,
    /// when rollback also failed, the ARNs left behind.
    pub fn create(&mut self, ctx: &CallContext) -> Result<ListenerOutput, ListenerError> {
        let id = self.id.to_string();
        if let Err(deploy_error) = self.deploy(ctx) {
            tracing::warn!(
                target: LISTENER_TARGET,
                listener = %id,
                error = %deploy_error,
                "create failed, rolling back"
            );
            let leaked = match self.destroy(ctx) {
                Ok(()) => Vec::new(),
                Err(rollback_error) => {
                    let leaked = arns(&self.components());
                    tracing::error!(
                        target: LISTENER_TARGET,
                        listener = %id,
                        error = %rollback_error,
                        resources = ?leaked,
                        "rollback failed; delete the listed resources manually"
                    );
                    leaked
                }
            };
            return Err(ListenerError::Create {
                id,
                source: Box::new(deploy_error),
                leaked,
            });
        }

        let bus = self
            .event_bus
            .as_ref()
            .ok_or_else(|| ListenerError::MissingEventBus { id: id.clone() })?;
        Ok(ListenerOutput {
            id,
            target_under_test: bus.resource(),
            components: self.components(),
        })
    }

    /// Deletes the rule, then the queue. Components that are already gone
    /// are skipped, so destroying twice is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Destroy`] wrapping the failed deletion; the
    /// component that failed stays on `self`.
    pub fn destroy(&mut self, ctx: &CallContext) -> Result<(), ListenerError> {
        if self.rule.is_none() && self.queue.is_none() {
            tracing::debug!(target: LISTENER_TARGET, listener = %self.id, "nothing to destroy");
            return Ok(());
        }
        tracing::info!(target: LISTENER_TARGET, listener = %self.id, "destroying listener");
        if let Some(existing) = &self.rule {
            rule::delete(
                self.clients.eventbridge.as_ref(),
                ctx,
                &existing.event_bus_name,
                &existing.name,
            )
            .map_err(|source| ListenerError::Destroy {
                id: self.id.to_string(),
                source: Box::new(source),
            })?;
        }
        self.rule = None;

        if let Some(existing) = &self.queue {
            queue::delete(self.clients.sqs.as_ref(), ctx, &existing.url).map_err(|source| {
                ListenerError::Destroy {
                    id: self.id.to_string(),
                    source: Box::new(source),
                }
            })?;
        }
        self.queue = None;
        tracing::info!(target: LISTENER_TARGET, listener = %self.id, "destroyed listener");
        Ok(())
    }

    /// Receives up to `max_number_of_messages` events, waiting at most
    /// `wait_time_seconds`, and acknowledges every received message in one
    /// batch.
    ///
    /// Bodies are returned in the order received; no acknowledgement is sent
    /// when nothing arrived.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::NoQueue`] when the listener has no queue, or
    /// the receive or delete failure.
    pub fn poll_events(
        &self,
        ctx: &CallContext,
        wait_time_seconds: i32,
        max_number_of_messages: i32,
    ) -> Result<Vec<String>, ListenerError> {
        let capture = self.queue.as_ref().ok_or_else(|| ListenerError::NoQueue {
            id: self.id.to_string(),
        })?;
        let request = ReceiveMessageRequest {
            queue_url: &capture.url,
            max_number_of_messages,
            wait_time_seconds,
            visibility_timeout: wait_time_seconds.saturating_add(VISIBILITY_GRACE_SECONDS),
        };
        let messages = self
            .clients
            .sqs
            .receive_message(ctx, request)
            .map_err(|source| ListenerError::ReceiveEvents { source })?;
        tracing::debug!(
            target: LISTENER_TARGET,
            listener = %self.id,
            received = messages.len(),
            "received events"
        );
        if messages.is_empty() {
            return Ok(Vec::new());
        }

        let entries: Vec<DeleteMessageBatchEntry> = messages
            .iter()
            .enumerate()
            .map(|(index, message)| DeleteMessageBatchEntry {
                id: index.to_string(),
                receipt_handle: message.receipt_handle.clone(),
            })
            .collect();
        self.clients
            .sqs
            .delete_message_batch(ctx, &capture.url, &entries)
            .map_err(|source| ListenerError::DeleteEvents { source })?;
        Ok(messages.into_iter().map(|message| message.body).collect())
    }
}

fn arns(resources: &[Resource]) -> Vec<String> {
    resources.iter().map(|resource| resource.arn.clone()).collect()
}
