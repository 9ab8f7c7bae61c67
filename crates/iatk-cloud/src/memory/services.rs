//! Client trait implementations for [`MemoryCloud`].

use std::collections::BTreeMap;

use super::{ACCOUNT_ID, MemoryCloud, MemoryQueue, MemoryRule, REGION, paginate, rule_arn};
use crate::cloudformation::{self, CloudFormationApi, StackDescription, StackPage};
use crate::context::CallContext;
use crate::error::ApiError;
use crate::eventbridge::{
    self, EventBridgeApi, EventBusDescription, PutRuleRequest, RuleDescription, Target,
    TargetPage,
};
use crate::schemas::{self, SchemaDescription, SchemasApi};
use crate::sqs::{
    self, CreateQueueRequest, DeleteMessageBatchEntry, Message, ReceiveMessageRequest, SqsApi,
};
use crate::tagging::{self, ResourcePage, ResourceTagMapping, TagFilter, TaggingApi};
use crate::xray::{self, RawTrace, TracePage, XRayApi};

/// Accepts either a bus name or a bus ARN, as the service does.
fn bus_name(raw: &str) -> &str {
    raw.rsplit_once(":event-bus/").map_or(raw, |(_, name)| name)
}

fn queue_name_from_url(url: &str) -> &str {
    url.rsplit_once('/').map_or(url, |(_, name)| name)
}

fn missing_queue(operation: &'static str) -> ApiError {
    ApiError::service(
        sqs::SERVICE,
        operation,
        "AWS.SimpleQueueService.NonExistentQueue",
        "The specified queue does not exist.",
    )
}

fn missing_rule(operation: &'static str, name: &str, bus: &str) -> ApiError {
    ApiError::not_found(
        eventbridge::SERVICE,
        operation,
        format!("Rule {name} does not exist on EventBus {bus}."),
    )
}

impl EventBridgeApi for MemoryCloud {
    fn describe_event_bus(
        &self,
        ctx: &CallContext,
        name: &str,
    ) -> Result<EventBusDescription, ApiError> {
        let state = self.enter(ctx, eventbridge::SERVICE, "DescribeEventBus")?;
        let bus = bus_name(name);
        state
            .buses
            .get(bus)
            .map(|arn| EventBusDescription {
                name: bus.to_owned(),
                arn: arn.clone(),
            })
            .ok_or_else(|| {
                ApiError::not_found(
                    eventbridge::SERVICE,
                    "DescribeEventBus",
                    format!("Event bus {bus} does not exist."),
                )
            })
    }

    fn describe_rule(
        &self,
        ctx: &CallContext,
        name: &str,
        event_bus_name: &str,
    ) -> Result<RuleDescription, ApiError> {
        let state = self.enter(ctx, eventbridge::SERVICE, "DescribeRule")?;
        let bus = bus_name(event_bus_name);
        state
            .rules
            .get(&(bus.to_owned(), name.to_owned()))
            .map(|rule| RuleDescription {
                name: name.to_owned(),
                event_bus_name: bus.to_owned(),
                event_pattern: rule.event_pattern.clone(),
                arn: rule.arn.clone(),
            })
            .ok_or_else(|| missing_rule("DescribeRule", name, bus))
    }

    fn list_targets_by_rule(
        &self,
        ctx: &CallContext,
        rule: &str,
        event_bus_name: &str,
        next_token: Option<&str>,
    ) -> Result<TargetPage, ApiError> {
        let state = self.enter(ctx, eventbridge::SERVICE, "ListTargetsByRule")?;
        let bus = bus_name(event_bus_name);
        let entry = state
            .rules
            .get(&(bus.to_owned(), rule.to_owned()))
            .ok_or_else(|| missing_rule("ListTargetsByRule", rule, bus))?;
        let (targets, token) = paginate(&entry.targets, next_token, self.page_size());
        Ok(TargetPage {
            targets,
            next_token: token,
        })
    }

    fn put_rule(&self, ctx: &CallContext, request: &PutRuleRequest) -> Result<String, ApiError> {
        let mut state = self.enter(ctx, eventbridge::SERVICE, "PutRule")?;
        let bus = bus_name(&request.event_bus_name).to_owned();
        if !state.buses.contains_key(&bus) {
            return Err(ApiError::not_found(
                eventbridge::SERVICE,
                "PutRule",
                format!("Event bus {bus} does not exist."),
            ));
        }
        let arn = rule_arn(&bus, &request.name);
        let entry = state
            .rules
            .entry((bus, request.name.clone()))
            .or_insert_with(MemoryRule::default);
        entry.arn.clone_from(&arn);
        entry.event_pattern.clone_from(&request.event_pattern);
        entry.description.clone_from(&request.description);
        entry.tags.clone_from(&request.tags);
        Ok(arn)
    }

    fn put_targets(
        &self,
        ctx: &CallContext,
        rule: &str,
        event_bus_name: &str,
        targets: &[Target],
    ) -> Result<(), ApiError> {
        let mut state = self.enter(ctx, eventbridge::SERVICE, "PutTargets")?;
        let bus = bus_name(event_bus_name);
        let entry = state
            .rules
            .get_mut(&(bus.to_owned(), rule.to_owned()))
            .ok_or_else(|| missing_rule("PutTargets", rule, bus))?;
        for target in targets {
            entry.targets.retain(|existing| existing.id != target.id);
            entry.targets.push(target.clone());
        }
        Ok(())
    }

    fn remove_targets(
        &self,
        ctx: &CallContext,
        rule: &str,
        event_bus_name: &str,
        ids: &[String],
    ) -> Result<(), ApiError> {
        let mut state = self.enter(ctx, eventbridge::SERVICE, "RemoveTargets")?;
        let bus = bus_name(event_bus_name);
        let entry = state
            .rules
            .get_mut(&(bus.to_owned(), rule.to_owned()))
            .ok_or_else(|| missing_rule("RemoveTargets", rule, bus))?;
        entry.targets.retain(|target| !ids.contains(&target.id));
        Ok(())
    }

    fn delete_rule(
        &self,
        ctx: &CallContext,
        name: &str,
        event_bus_name: &str,
    ) -> Result<(), ApiError> {
        let mut state = self.enter(ctx, eventbridge::SERVICE, "DeleteRule")?;
        let key = (bus_name(event_bus_name).to_owned(), name.to_owned());
        if state
            .rules
            .get(&key)
            .is_some_and(|rule| !rule.targets.is_empty())
        {
            return Err(ApiError::service(
                eventbridge::SERVICE,
                "DeleteRule",
                "ValidationException",
                "Rule can't be deleted since it has targets.",
            ));
        }
        state.rules.remove(&key);
        Ok(())
    }
}

impl SqsApi for MemoryCloud {
    fn create_queue(
        &self,
        ctx: &CallContext,
        request: &CreateQueueRequest,
    ) -> Result<String, ApiError> {
        let mut state = self.enter(ctx, sqs::SERVICE, "CreateQueue")?;
        if state.queues.contains_key(&request.name) {
            return Err(ApiError::service(
                sqs::SERVICE,
                "CreateQueue",
                "QueueAlreadyExists",
                format!("A queue named {} already exists.", request.name),
            ));
        }
        let url = format!(
            "https://sqs.{REGION}.amazonaws.com/{ACCOUNT_ID}/{}",
            request.name
        );
        state.queues.insert(
            request.name.clone(),
            MemoryQueue {
                url: url.clone(),
                arn: format!("arn:aws:sqs:{REGION}:{ACCOUNT_ID}:{}", request.name),
                attributes: request.attributes.clone(),
                tags: request.tags.clone(),
                ..MemoryQueue::default()
            },
        );
        Ok(url)
    }

    fn get_queue_attributes(
        &self,
        ctx: &CallContext,
        queue_url: &str,
        names: &[&str],
    ) -> Result<BTreeMap<String, String>, ApiError> {
        let state = self.enter(ctx, sqs::SERVICE, "GetQueueAttributes")?;
        let queue = state
            .queues
            .get(queue_name_from_url(queue_url))
            .ok_or_else(|| missing_queue("GetQueueAttributes"))?;
        let mut attributes = BTreeMap::new();
        for name in names {
            if *name == sqs::ATTRIBUTE_QUEUE_ARN {
                attributes.insert((*name).to_owned(), queue.arn.clone());
            } else if let Some(value) = queue.attributes.get(*name) {
                attributes.insert((*name).to_owned(), value.clone());
            }
        }
        Ok(attributes)
    }

    fn get_queue_url(&self, ctx: &CallContext, name: &str) -> Result<String, ApiError> {
        let state = self.enter(ctx, sqs::SERVICE, "GetQueueUrl")?;
        state
            .queues
            .get(name)
            .map(|queue| queue.url.clone())
            .ok_or_else(|| missing_queue("GetQueueUrl"))
    }

    fn list_queue_tags(
        &self,
        ctx: &CallContext,
        queue_url: &str,
    ) -> Result<BTreeMap<String, String>, ApiError> {
        let state = self.enter(ctx, sqs::SERVICE, "ListQueueTags")?;
        state
            .queues
            .get(queue_name_from_url(queue_url))
            .map(|queue| queue.tags.clone())
            .ok_or_else(|| missing_queue("ListQueueTags"))
    }

    fn delete_queue(&self, ctx: &CallContext, queue_url: &str) -> Result<(), ApiError> {
        let mut state = self.enter(ctx, sqs::SERVICE, "DeleteQueue")?;
        state
            .queues
            .remove(queue_name_from_url(queue_url))
            .map(|_| ())
            .ok_or_else(|| missing_queue("DeleteQueue"))
    }

    fn receive_message(
        &self,
        ctx: &CallContext,
        request: ReceiveMessageRequest<'_>,
    ) -> Result<Vec<Message>, ApiError> {
        let mut state = self.enter(ctx, sqs::SERVICE, "ReceiveMessage")?;
        state.receives.push(request.into());
        let queue = state
            .queues
            .get_mut(queue_name_from_url(request.queue_url))
            .ok_or_else(|| missing_queue("ReceiveMessage"))?;
        let limit = usize::try_from(request.max_number_of_messages.clamp(1, 10)).unwrap_or(1);
        let mut messages = Vec::new();
        while messages.len() < limit {
            let Some((message_id, body)) = queue.pending.pop_front() else {
                break;
            };
            let receipt_handle = format!("receipt-{message_id}");
            queue.in_flight.insert(receipt_handle.clone(), body.clone());
            messages.push(Message {
                message_id,
                body,
                receipt_handle,
            });
        }
        Ok(messages)
    }

    fn delete_message_batch(
        &self,
        ctx: &CallContext,
        queue_url: &str,
        entries: &[DeleteMessageBatchEntry],
    ) -> Result<(), ApiError> {
        let mut state = self.enter(ctx, sqs::SERVICE, "DeleteMessageBatch")?;
        if entries.is_empty() {
            return Err(ApiError::service(
                sqs::SERVICE,
                "DeleteMessageBatch",
                "AWS.SimpleQueueService.EmptyBatchRequest",
                "There should be at least one DeleteMessageBatchRequestEntry in the request.",
            ));
        }
        let queue = state
            .queues
            .get_mut(queue_name_from_url(queue_url))
            .ok_or_else(|| missing_queue("DeleteMessageBatch"))?;
        for entry in entries {
            queue.in_flight.remove(&entry.receipt_handle);
        }
        state
            .deleted_receipts
            .extend(entries.iter().map(|entry| entry.receipt_handle.clone()));
        Ok(())
    }
}

impl TaggingApi for MemoryCloud {
    fn get_resources(
        &self,
        ctx: &CallContext,
        filters: &[TagFilter],
        pagination_token: Option<&str>,
    ) -> Result<ResourcePage, ApiError> {
        let state = self.enter(ctx, tagging::SERVICE, "GetResources")?;
        let queues = state.queues.values().map(|queue| (&queue.arn, &queue.tags));
        let rules = state.rules.values().map(|rule| (&rule.arn, &rule.tags));
        let mut mappings: Vec<ResourceTagMapping> = queues
            .chain(rules)
            .filter(|(_, tags)| !tags.is_empty())
            .filter(|(_, tags)| filters.iter().all(|filter| filter.matches(tags)))
            .map(|(arn, tags)| ResourceTagMapping {
                resource_arn: arn.clone(),
                tags: tags.clone(),
            })
            .collect();
        mappings.sort_by(|left, right| left.resource_arn.cmp(&right.resource_arn));
        let (page, token) = paginate(&mappings, pagination_token, self.page_size());
        Ok(ResourcePage {
            mappings: page,
            pagination_token: token,
        })
    }
}

impl CloudFormationApi for MemoryCloud {
    fn describe_stack_resource(
        &self,
        ctx: &CallContext,
        stack_name: &str,
        logical_resource_id: &str,
    ) -> Result<String, ApiError> {
        let state = self.enter(ctx, cloudformation::SERVICE, "DescribeStackResource")?;
        let stack = state.stacks.get(stack_name).ok_or_else(|| {
            ApiError::service(
                cloudformation::SERVICE,
                "DescribeStackResource",
                "ValidationError",
                format!("Stack '{stack_name}' does not exist"),
            )
        })?;
        stack
            .resources
            .get(logical_resource_id)
            .cloned()
            .ok_or_else(|| {
                ApiError::service(
                    cloudformation::SERVICE,
                    "DescribeStackResource",
                    "ValidationError",
                    format!("Resource {logical_resource_id} does not exist for stack {stack_name}"),
                )
            })
    }

    fn describe_stacks(
        &self,
        ctx: &CallContext,
        stack_name: &str,
        next_token: Option<&str>,
    ) -> Result<StackPage, ApiError> {
        let state = self.enter(ctx, cloudformation::SERVICE, "DescribeStacks")?;
        let stack = state.stacks.get(stack_name).ok_or_else(|| {
            ApiError::service(
                cloudformation::SERVICE,
                "DescribeStacks",
                "ValidationError",
                format!("Stack with id {stack_name} does not exist"),
            )
        })?;
        let stacks = [StackDescription {
            name: stack_name.to_owned(),
            outputs: stack.outputs.clone(),
        }];
        let (page, token) = paginate(&stacks, next_token, self.page_size());
        Ok(StackPage {
            stacks: page,
            next_token: token,
        })
    }
}

impl XRayApi for MemoryCloud {
    fn batch_get_traces(
        &self,
        ctx: &CallContext,
        trace_ids: &[String],
        next_token: Option<&str>,
    ) -> Result<TracePage, ApiError> {
        let mut state = self.enter(ctx, xray::SERVICE, "BatchGetTraces")?;
        if state.deferred_trace_rounds > 0 {
            state.deferred_trace_rounds -= 1;
            return Ok(TracePage {
                unprocessed_trace_ids: trace_ids.to_vec(),
                ..TracePage::default()
            });
        }
        let traces: Vec<RawTrace> = trace_ids
            .iter()
            .filter_map(|id| {
                state.traces.get(id).map(|segments| RawTrace {
                    id: id.clone(),
                    segments: segments.clone(),
                })
            })
            .collect();
        let (page, token) = paginate(&traces, next_token, self.page_size());
        Ok(TracePage {
            traces: page,
            unprocessed_trace_ids: Vec::new(),
            next_token: token,
        })
    }
}

impl SchemasApi for MemoryCloud {
    fn describe_schema(
        &self,
        ctx: &CallContext,
        registry_name: &str,
        schema_name: &str,
        _schema_version: Option<&str>,
    ) -> Result<SchemaDescription, ApiError> {
        let state = self.enter(ctx, schemas::SERVICE, "DescribeSchema")?;
        state
            .schemas
            .get(&(registry_name.to_owned(), schema_name.to_owned()))
            .cloned()
            .ok_or_else(|| {
                ApiError::service(
                    schemas::SERVICE,
                    "DescribeSchema",
                    "NotFoundException",
                    format!("Schema {schema_name} does not exist in registry {registry_name}."),
                )
            })
    }
}
