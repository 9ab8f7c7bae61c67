//! In-memory cloud used by workspace tests.
//!
//! [`MemoryCloud`] implements every client trait against a shared state
//! guarded by a mutex. Tests seed buses, rules, stacks, traces and schemas,
//! inject failures per operation and inspect the recorded call log.

mod services;

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::cloudformation::{CloudFormationApi, StackOutput};
use crate::context::CallContext;
use crate::error::ApiError;
use crate::eventbridge::{EventBridgeApi, Target};
use crate::provider::{ClientSettings, CloudClients, CloudProvider, ProviderError};
use crate::schemas::{SchemaDescription, SchemasApi};
use crate::sqs::{ReceiveMessageRequest, SqsApi};
use crate::tagging::TaggingApi;
use crate::xray::{RawSegment, XRayApi};

const DEFAULT_PAGE_SIZE: usize = 100;

/// Account id used by ARNs minted by [`MemoryCloud`].
pub const ACCOUNT_ID: &str = "123456789012";
/// Region used by ARNs minted by [`MemoryCloud`].
pub const REGION: &str = "us-east-1";

#[derive(Debug, Clone)]
struct InjectedFailure {
    code: String,
    message: String,
    remaining: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryRule {
    pub(crate) arn: String,
    pub(crate) event_pattern: String,
    pub(crate) description: String,
    pub(crate) tags: BTreeMap<String, String>,
    pub(crate) targets: Vec<Target>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryQueue {
    pub(crate) url: String,
    pub(crate) arn: String,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) tags: BTreeMap<String, String>,
    pub(crate) pending: VecDeque<(String, String)>,
    pub(crate) in_flight: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryStack {
    pub(crate) resources: BTreeMap<String, String>,
    pub(crate) outputs: Vec<StackOutput>,
}

/// Snapshot of a `ReceiveMessage` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveRecord {
    /// Requested maximum number of messages.
    pub max_number_of_messages: i32,
    /// Requested long-poll duration.
    pub wait_time_seconds: i32,
    /// Requested visibility timeout.
    pub visibility_timeout: i32,
}

impl From<ReceiveMessageRequest<'_>> for ReceiveRecord {
    fn from(request: ReceiveMessageRequest<'_>) -> Self {
        Self {
            max_number_of_messages: request.max_number_of_messages,
            wait_time_seconds: request.wait_time_seconds,
            visibility_timeout: request.visibility_timeout,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct CloudState {
    pub(crate) buses: BTreeMap<String, String>,
    pub(crate) rules: BTreeMap<(String, String), MemoryRule>,
    pub(crate) queues: BTreeMap<String, MemoryQueue>,
    pub(crate) stacks: BTreeMap<String, MemoryStack>,
    pub(crate) traces: BTreeMap<String, Vec<RawSegment>>,
    pub(crate) schemas: BTreeMap<(String, String), SchemaDescription>,
    pub(crate) deferred_trace_rounds: usize,
    pub(crate) receives: Vec<ReceiveRecord>,
    pub(crate) deleted_receipts: Vec<String>,
    pub(crate) next_message: u64,
}

/// In-process implementation of every cloud client trait.
#[derive(Debug)]
pub struct MemoryCloud {
    state: Mutex<CloudState>,
    failures: Mutex<BTreeMap<&'static str, InjectedFailure>>,
    calls: Mutex<Vec<&'static str>>,
    page_size: usize,
}

impl Default for MemoryCloud {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryCloud {
    /// Creates an empty cloud with the `default` event bus.
    #[must_use]
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Creates an empty cloud whose paginated calls return at most
    /// `page_size` items per page.
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        let cloud = Self {
            state: Mutex::new(CloudState::default()),
            failures: Mutex::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
            page_size: page_size.max(1),
        };
        cloud.add_event_bus("default");
        cloud
    }

    /// Wraps the cloud into a client bundle.
    #[must_use]
    pub fn clients(self: &Arc<Self>) -> CloudClients {
        CloudClients {
            eventbridge: Arc::clone(self) as Arc<dyn EventBridgeApi>,
            sqs: Arc::clone(self) as Arc<dyn SqsApi>,
            tagging: Arc::clone(self) as Arc<dyn TaggingApi>,
            cloudformation: Arc::clone(self) as Arc<dyn CloudFormationApi>,
            xray: Arc::clone(self) as Arc<dyn XRayApi>,
            schemas: Arc::clone(self) as Arc<dyn SchemasApi>,
        }
    }

    /// ARN minted for a bus named `name`.
    #[must_use]
    pub fn event_bus_arn(name: &str) -> String {
        format!("arn:aws:events:{REGION}:{ACCOUNT_ID}:event-bus/{name}")
    }

    /// Registers an event bus and returns its ARN.
    pub fn add_event_bus(&self, name: &str) -> String {
        let arn = Self::event_bus_arn(name);
        lock(&self.state).buses.insert(name.to_owned(), arn.clone());
        arn
    }

    /// Registers a rule on an existing or implicit bus and returns its ARN.
    pub fn add_rule(&self, event_bus_name: &str, name: &str, event_pattern: &str) -> String {
        let arn = rule_arn(event_bus_name, name);
        lock(&self.state).rules.insert(
            (event_bus_name.to_owned(), name.to_owned()),
            MemoryRule {
                arn: arn.clone(),
                event_pattern: event_pattern.to_owned(),
                ..MemoryRule::default()
            },
        );
        arn
    }

    /// Attaches a target to a seeded rule.
    pub fn add_target(&self, event_bus_name: &str, rule: &str, target: Target) {
        if let Some(entry) = lock(&self.state)
            .rules
            .get_mut(&(event_bus_name.to_owned(), rule.to_owned()))
        {
            entry.targets.push(target);
        }
    }

    /// Registers a stack with resources keyed by logical id and its outputs.
    pub fn add_stack(
        &self,
        name: &str,
        resources: &[(&str, &str)],
        outputs: &[(&str, &str)],
    ) {
        let stack = MemoryStack {
            resources: resources
                .iter()
                .map(|(logical, physical)| ((*logical).to_owned(), (*physical).to_owned()))
                .collect(),
            outputs: outputs
                .iter()
                .map(|(key, value)| StackOutput {
                    key: (*key).to_owned(),
                    value: (*value).to_owned(),
                })
                .collect(),
        };
        lock(&self.state).stacks.insert(name.to_owned(), stack);
    }

    /// Stores a trace made of raw segment documents.
    pub fn add_trace(&self, trace_id: &str, documents: &[String]) {
        let segments = documents
            .iter()
            .enumerate()
            .map(|(index, document)| RawSegment {
                id: format!("{trace_id}-{index}"),
                document: document.clone(),
            })
            .collect();
        lock(&self.state).traces.insert(trace_id.to_owned(), segments);
    }

    /// Reports every requested trace as unprocessed for the next `rounds`
    /// `BatchGetTraces` calls.
    pub fn defer_traces(&self, rounds: usize) {
        lock(&self.state).deferred_trace_rounds = rounds;
    }

    /// Registers a schema in a registry.
    pub fn add_schema(&self, registry: &str, name: &str, schema_type: &str, content: &str) {
        lock(&self.state).schemas.insert(
            (registry.to_owned(), name.to_owned()),
            SchemaDescription {
                content: content.to_owned(),
                schema_type: schema_type.to_owned(),
                version: "1".to_owned(),
            },
        );
    }

    /// Enqueues a message on the named queue. Returns `false` when no such
    /// queue exists.
    pub fn send_message(&self, queue_name: &str, body: &str) -> bool {
        let mut state = lock(&self.state);
        state.next_message += 1;
        let id = format!("msg-{}", state.next_message);
        state.queues.get_mut(queue_name).is_some_and(|queue| {
            queue.pending.push_back((id, body.to_owned()));
            true
        })
    }

    /// Makes every subsequent call to `operation` fail.
    pub fn fail_always(&self, operation: &'static str, message: &str) {
        self.inject(operation, message, None);
    }

    /// Makes the next call to `operation` fail.
    pub fn fail_once(&self, operation: &'static str, message: &str) {
        self.inject(operation, message, Some(1));
    }

    /// Removes any failure injected for `operation`.
    pub fn clear_failure(&self, operation: &'static str) {
        lock(&self.failures).remove(operation);
    }

    fn inject(&self, operation: &'static str, message: &str, remaining: Option<usize>) {
        lock(&self.failures).insert(
            operation,
            InjectedFailure {
                code: "InjectedFailure".to_owned(),
                message: message.to_owned(),
                remaining,
            },
        );
    }

    /// Operations called so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<&'static str> {
        lock(&self.calls).clone()
    }

    /// Number of times `operation` has been called.
    #[must_use]
    pub fn call_count(&self, operation: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|name| **name == operation)
            .count()
    }

    /// Names of existing queues.
    #[must_use]
    pub fn queue_names(&self) -> Vec<String> {
        lock(&self.state).queues.keys().cloned().collect()
    }

    /// Names of existing rules on `event_bus_name`.
    #[must_use]
    pub fn rule_names(&self, event_bus_name: &str) -> Vec<String> {
        lock(&self.state)
            .rules
            .keys()
            .filter(|(bus, _)| bus == event_bus_name)
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Tags of the named queue.
    #[must_use]
    pub fn queue_tags(&self, queue_name: &str) -> Option<BTreeMap<String, String>> {
        lock(&self.state)
            .queues
            .get(queue_name)
            .map(|queue| queue.tags.clone())
    }

    /// Attributes of the named queue.
    #[must_use]
    pub fn queue_attributes(&self, queue_name: &str) -> Option<BTreeMap<String, String>> {
        lock(&self.state)
            .queues
            .get(queue_name)
            .map(|queue| queue.attributes.clone())
    }

    /// Number of messages waiting on the named queue.
    #[must_use]
    pub fn pending_messages(&self, queue_name: &str) -> usize {
        lock(&self.state)
            .queues
            .get(queue_name)
            .map_or(0, |queue| queue.pending.len() + queue.in_flight.len())
    }

    /// Tags of a rule.
    #[must_use]
    pub fn rule_tags(&self, event_bus_name: &str, rule: &str) -> Option<BTreeMap<String, String>> {
        lock(&self.state)
            .rules
            .get(&(event_bus_name.to_owned(), rule.to_owned()))
            .map(|entry| entry.tags.clone())
    }

    /// Description of a rule.
    #[must_use]
    pub fn rule_description(&self, event_bus_name: &str, rule: &str) -> Option<String> {
        lock(&self.state)
            .rules
            .get(&(event_bus_name.to_owned(), rule.to_owned()))
            .map(|entry| entry.description.clone())
    }

    /// Targets of a rule.
    #[must_use]
    pub fn rule_targets(&self, event_bus_name: &str, rule: &str) -> Vec<Target> {
        lock(&self.state)
            .rules
            .get(&(event_bus_name.to_owned(), rule.to_owned()))
            .map(|entry| entry.targets.clone())
            .unwrap_or_default()
    }

    /// Recorded `ReceiveMessage` calls.
    #[must_use]
    pub fn receives(&self) -> Vec<ReceiveRecord> {
        lock(&self.state).receives.clone()
    }

    /// Receipt handles acknowledged through `DeleteMessageBatch`.
    #[must_use]
    pub fn deleted_receipts(&self) -> Vec<String> {
        lock(&self.state).deleted_receipts.clone()
    }

    /// Records the call, honours the context and applies injected failures.
    fn enter(
        &self,
        ctx: &CallContext,
        service: &'static str,
        operation: &'static str,
    ) -> Result<MutexGuard<'_, CloudState>, ApiError> {
        lock(&self.calls).push(operation);
        ctx.check(service, operation)?;
        let mut failures = lock(&self.failures);
        if let Some(failure) = failures.get_mut(operation) {
            let error = ApiError::service(
                service,
                operation,
                failure.code.clone(),
                failure.message.clone(),
            );
            let exhausted = failure.remaining.as_mut().is_some_and(|remaining| {
                *remaining = remaining.saturating_sub(1);
                *remaining == 0
            });
            if exhausted {
                failures.remove(operation);
            }
            return Err(error);
        }
        drop(failures);
        Ok(lock(&self.state))
    }

    pub(crate) const fn page_size(&self) -> usize {
        self.page_size
    }
}

pub(crate) fn rule_arn(event_bus_name: &str, name: &str) -> String {
    if event_bus_name == "default" {
        format!("arn:aws:events:{REGION}:{ACCOUNT_ID}:rule/{name}")
    } else {
        format!("arn:aws:events:{REGION}:{ACCOUNT_ID}:rule/{event_bus_name}/{name}")
    }
}

/// Returns the items of page `token` and the token of the following page.
pub(crate) fn paginate<T: Clone>(
    items: &[T],
    token: Option<&str>,
    page_size: usize,
) -> (Vec<T>, Option<String>) {
    let start = token.and_then(|raw| raw.parse::<usize>().ok()).unwrap_or(0);
    let end = start.saturating_add(page_size).min(items.len());
    let page = items.get(start..end).map(<[T]>::to_vec).unwrap_or_default();
    let next = (end < items.len()).then(|| end.to_string());
    (page, next)
}

/// Provider handing out clients backed by a shared [`MemoryCloud`].
#[derive(Debug, Default)]
pub struct MemoryProvider {
    cloud: Arc<MemoryCloud>,
    requests: Mutex<Vec<ClientSettings>>,
}

impl MemoryProvider {
    /// Creates a provider over `cloud`.
    #[must_use]
    pub fn new(cloud: Arc<MemoryCloud>) -> Self {
        Self {
            cloud,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Settings passed to every [`CloudProvider::clients`] call so far.
    #[must_use]
    pub fn requests(&self) -> Vec<ClientSettings> {
        lock(&self.requests).clone()
    }
}

impl CloudProvider for MemoryProvider {
    fn clients(&self, settings: &ClientSettings) -> Result<CloudClients, ProviderError> {
        lock(&self.requests).push(settings.clone());
        Ok(self.cloud.clients())
    }
}
