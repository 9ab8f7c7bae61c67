//! Event-bus listener methods: add, remove and poll.

use std::collections::BTreeMap;

use iatk_cloud::tagging::TagFilter;
use iatk_harness::{
    DestroyOptions, Listener, ListenerClients, ListenerSpec, destroy_multiple,
    destroy_with_tag_filters, validate_tags,
};
use serde::Deserialize;
use serde_json::Value;

use super::{HANDLER_TARGET, HandlerContext, MethodError, output, require};

/// Output of a successful `remove_listeners` call.
pub const REMOVE_SUCCESS: &str = "success";

/// Longest accepted long-poll wait.
pub const MAX_WAIT_TIME_SECONDS: i32 = 20;

/// Largest accepted batch of events per poll.
pub const MAX_NUMBER_OF_MESSAGES: i32 = 10;

/// Parameters of `test_harness.eventbridge.add_listener`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields, default)]
pub struct AddListenerParams {
    /// Bus carrying the rule under test.
    pub event_bus_name: String,
    /// Rule whose pattern the listener copies.
    pub rule_name: String,
    /// Target of the rule whose input shaping is copied.
    pub target_id: String,
    /// Caller tags added to every listener resource.
    pub tags: BTreeMap<String, String>,
    /// Region override.
    pub region: Option<String>,
    /// Profile override.
    pub profile: Option<String>,
}

/// Parameters of `test_harness.eventbridge.remove_listeners`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields, default)]
pub struct RemoveListenersParams {
    /// Listener ids to destroy.
    pub ids: Option<Vec<String>>,
    /// Tag filters selecting the listeners to destroy.
    pub tag_filters: Option<Vec<TagFilter>>,
    /// Region override.
    pub region: Option<String>,
    /// Profile override.
    pub profile: Option<String>,
}

/// Parameters of `test_harness.eventbridge.poll_events`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields, default)]
pub struct PollEventsParams {
    /// Listener to poll.
    pub listener_id: String,
    /// Long-poll wait in seconds; defaults to 0.
    pub wait_time_seconds: Option<i32>,
    /// Upper bound on returned events; defaults to 1.
    pub max_number_of_messages: Option<i32>,
    /// Region override.
    pub region: Option<String>,
    /// Profile override.
    pub profile: Option<String>,
}

impl PollEventsParams {
    fn validated(&self) -> Result<(i32, i32), MethodError> {
        require(&self.listener_id, "ListenerId")?;
        let max_messages = self.max_number_of_messages.unwrap_or(1);
        if !(1..=MAX_NUMBER_OF_MESSAGES).contains(&max_messages) {
            return Err(MethodError::invalid(format!(
                "\"MaxNumberOfMessages\" must be an integer between 1 and {MAX_NUMBER_OF_MESSAGES}"
            )));
        }
        let wait_time = self.wait_time_seconds.unwrap_or(0);
        if !(0..=MAX_WAIT_TIME_SECONDS).contains(&wait_time) {
            return Err(MethodError::invalid(format!(
                "\"WaitTimeSeconds\" must be an integer between 0 and {MAX_WAIT_TIME_SECONDS}"
            )));
        }
        Ok((wait_time, max_messages))
    }
}

/// Creates a listener for a rule and returns its id and components.
///
/// # Errors
///
/// Returns [`MethodError`] for blank parameters, reserved tags, an
/// unresolvable target or a failed (and rolled back) create.
pub fn add_listener(
    params: AddListenerParams,
    ctx: &HandlerContext<'_>,
) -> Result<Value, MethodError> {
    require(&params.event_bus_name, "EventBusName")?;
    require(&params.rule_name, "RuleName")?;
    validate_tags(&params.tags).map_err(|source| MethodError::Tags { source })?;

    let clients = ctx.clients(params.region.as_deref(), params.profile.as_deref())?;
    let spec = ListenerSpec {
        event_bus_name: params.event_bus_name,
        rule_name: params.rule_name,
        target_id: params.target_id,
        tags: params.tags,
    };
    let mut listener = Listener::new(ListenerClients::from(&clients), ctx.call(), &spec)
        .map_err(|source| MethodError::LocateTarget { source })?;
    let created = listener.create(ctx.call())?;
    tracing::info!(target: HANDLER_TARGET, listener = %created.id, "listener added");
    output(&created)
}

/// Destroys listeners chosen by id or by tag filter.
///
/// # Errors
///
/// Returns [`MethodError::InvalidParams`] when both selectors are given, or
/// the aggregated destroy failure.
pub fn remove_listeners(
    params: RemoveListenersParams,
    ctx: &HandlerContext<'_>,
) -> Result<Value, MethodError> {
    if params.ids.is_some() && params.tag_filters.is_some() {
        return Err(MethodError::invalid(
            "only one of Ids and TagFilters is needed, not both",
        ));
    }
    let clients = ctx.clients(params.region.as_deref(), params.profile.as_deref())?;
    let listener_clients = ListenerClients::from(&clients);
    let options = DestroyOptions::default();
    if let Some(filters) = params.tag_filters {
        destroy_with_tag_filters(
            &listener_clients,
            clients.tagging.as_ref(),
            ctx.call(),
            &filters,
            options,
        )?;
    } else {
        let ids = params.ids.unwrap_or_default();
        destroy_multiple(&listener_clients, ctx.call(), &ids, options)?;
    }
    output(&REMOVE_SUCCESS)
}

/// Receives and acknowledges captured events of a listener.
///
/// # Errors
///
/// Returns [`MethodError`] for invalid parameters, an unknown listener or a
/// failed receive.
pub fn poll_events(
    params: PollEventsParams,
    ctx: &HandlerContext<'_>,
) -> Result<Value, MethodError> {
    let (wait_time, max_messages) = params.validated()?;
    let clients = ctx.clients(params.region.as_deref(), params.profile.as_deref())?;
    let listener = Listener::get(ListenerClients::from(&clients), ctx.call(), &params.listener_id)
        .map_err(|source| MethodError::RetrieveListener { source })?;
    let events = listener
        .poll_events(ctx.call(), wait_time, max_messages)
        .map_err(|source| MethodError::PollEvents { source })?;
    output(&events)
}
