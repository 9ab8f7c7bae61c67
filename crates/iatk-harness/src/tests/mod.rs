//! Unit and behavioural tests for the listener engine and its drivers.


use std::collections::BTreeMap;
use std::sync::Arc;

use iatk_cloud::CallContext;
use iatk_cloud::eventbridge::Target;
use iatk_cloud::memory::MemoryCloud;
use iatk_cloud::sqs;
use iatk_cloud::tagging::TagFilter;
use rstest::{fixture, rstest};

use crate::listener::{
    DestroyOptions, Listener, ListenerClients, ListenerError, ListenerSpec, destroy_multiple,
    destroy_with_tag_filters,
};
use crate::resource::ResourceType;
use crate::tags::SystemTagKey;

const BUS: &str = "orders";
const SOURCE_RULE: &str = "order-created";
const PATTERN: &str = r#"{"source":["shop"]}"#;

#[fixture]
fn cloud() -> Arc<MemoryCloud> {
    let cloud = Arc::new(MemoryCloud::new());
    cloud.add_event_bus(BUS);
    cloud.add_rule(BUS, SOURCE_RULE, PATTERN);
    cloud
}

fn clients(cloud: &Arc<MemoryCloud>) -> ListenerClients {
    ListenerClients::from(&cloud.clients())
}

fn spec(tags: &[(&str, &str)]) -> ListenerSpec {
    ListenerSpec {
        event_bus_name: BUS.to_owned(),
        rule_name: SOURCE_RULE.to_owned(),
        target_id: String::new(),
        tags: tags
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect(),
    }
}

fn created(cloud: &Arc<MemoryCloud>, tags: &[(&str, &str)]) -> String {
    let ctx = CallContext::new();
    let mut listener = Listener::new(clients(cloud), &ctx, &spec(tags)).expect("preflight");
    listener.create(&ctx).expect("create").id
}

#[rstest]
fn create_provisions_tagged_rule_queue_and_binding(cloud: Arc<MemoryCloud>) {
    let ctx = CallContext::new();
    let mut listener =
        Listener::new(clients(&cloud), &ctx, &spec(&[("team", "core")])).expect("preflight");

    let output = listener.create(&ctx).expect("create");

    let kinds: Vec<_> = output
        .components
        .iter()
        .map(|component| component.resource_type)
        .collect();
    assert_eq!(kinds, vec![ResourceType::Queue, ResourceType::Rule]);
    assert_eq!(output.target_under_test.resource_type, ResourceType::EventBus);
    assert_eq!(output.target_under_test.physical_id, BUS);

    let bus_arn = MemoryCloud::event_bus_arn(BUS);
    for tags in [
        cloud.queue_tags(&output.id).expect("queue"),
        cloud.rule_tags(BUS, &output.id).expect("rule"),
    ] {
        assert_eq!(tags.get(SystemTagKey::Id.as_str()), Some(&output.id));
        assert_eq!(
            tags.get(SystemTagKey::Type.as_str()).map(String::as_str),
            Some("EventBridge.Listener")
        );
        assert_eq!(tags.get(SystemTagKey::Target.as_str()), Some(&bus_arn));
        assert!(tags.contains_key(SystemTagKey::Created.as_str()));
        assert_eq!(tags.get("team").map(String::as_str), Some("core"));
    }
}

#[rstest]
fn deploy_orders_rule_then_queue_then_binding(cloud: Arc<MemoryCloud>) {
    let id = created(&cloud, &[]);

    let mutating: Vec<_> = cloud
        .calls()
        .into_iter()
        .filter(|call| ["PutRule", "CreateQueue", "PutTargets"].contains(call))
        .collect();
    assert_eq!(mutating, vec!["PutRule", "CreateQueue", "PutTargets"]);

    let targets = cloud.rule_targets(BUS, &id);
    assert_eq!(targets.len(), 1);
    assert_eq!(targets.first().map(|target| target.id.as_str()), Some(id.as_str()));
    assert_eq!(
        cloud.rule_description(BUS, &id),
        Some(format!("rule for Listener \"{id}\"; created by iatk"))
    );
}

#[rstest]
fn queue_policy_admits_only_the_derived_rule(cloud: Arc<MemoryCloud>) {
    let id = created(&cloud, &[]);

    let attributes = cloud.queue_attributes(&id).expect("queue");
    let policy: serde_json::Value = serde_json::from_str(
        attributes
            .get(sqs::ATTRIBUTE_POLICY)
            .map(String::as_str)
            .unwrap_or_default(),
    )
    .expect("policy json");
    let rule_arn = format!("arn:aws:events:us-east-1:123456789012:rule/{BUS}/{id}");
    let queue_arn = format!("arn:aws:sqs:us-east-1:123456789012:{id}");

    assert_eq!(policy["Statement"][0]["Resource"], queue_arn.as_str());
    assert_eq!(
        policy["Statement"][0]["Condition"]["ArnEquals"]["aws:SourceArn"],
        rule_arn.as_str()
    );
    assert_eq!(
        attributes
            .get(sqs::ATTRIBUTE_MESSAGE_RETENTION_PERIOD)
            .map(String::as_str),
        Some("3600")
    );
}

#[rstest]
fn preflight_reports_missing_rule_without_side_effects(cloud: Arc<MemoryCloud>) {
    let ctx = CallContext::new();
    let mut request = spec(&[]);
    request.rule_name = "missing".to_owned();

    let error = Listener::new(clients(&cloud), &ctx, &request).expect_err("missing rule");

    assert!(
        error
            .to_string()
            .starts_with("RuleName \"missing\" was provided but not found for eventbus \"orders\"")
    );
    assert_eq!(cloud.call_count("PutRule"), 0);
    assert_eq!(cloud.call_count("CreateQueue"), 0);
}

#[rstest]
fn preflight_reports_missing_event_bus(cloud: Arc<MemoryCloud>) {
    let ctx = CallContext::new();
    let mut request = spec(&[]);
    request.event_bus_name = "nope".to_owned();

    let error = Listener::new(clients(&cloud), &ctx, &request).expect_err("missing bus");

    assert!(matches!(error, ListenerError::EventBus { .. }));
}

#[rstest]
fn source_target_shaping_is_carried_to_the_binding(cloud: Arc<MemoryCloud>) {
    cloud.add_target(
        BUS,
        SOURCE_RULE,
        Target {
            id: "lambda".to_owned(),
            arn: "arn:aws:lambda:us-east-1:123456789012:function:f".to_owned(),
            input_path: Some("$.detail".to_owned()),
            ..Target::default()
        },
    );
    let ctx = CallContext::new();
    let mut request = spec(&[]);
    request.target_id = "lambda".to_owned();

    let id = Listener::new(clients(&cloud), &ctx, &request)
        .expect("preflight")
        .create(&ctx)
        .expect("create")
        .id;

    let binding = cloud.rule_targets(BUS, &id);
    assert_eq!(
        binding.first().and_then(|target| target.input_path.as_deref()),
        Some("$.detail")
    );
}

#[rstest]
fn unknown_source_target_fails_preflight(cloud: Arc<MemoryCloud>) {
    let ctx = CallContext::new();
    let mut request = spec(&[]);
    request.target_id = "ghost".to_owned();

    let error = Listener::new(clients(&cloud), &ctx, &request).expect_err("unknown target");

    assert!(matches!(error, ListenerError::SourceTarget { .. }));
}

#[rstest]
fn failed_binding_rolls_back_everything(cloud: Arc<MemoryCloud>) {
    cloud.fail_always("PutTargets", "denied");
    let ctx = CallContext::new();
    let mut listener = Listener::new(clients(&cloud), &ctx, &spec(&[])).expect("preflight");
    let id = listener.id().to_string();

    let error = listener.create(&ctx).expect_err("binding fails");

    let message = error.to_string();
    assert!(message.starts_with(&format!("failed to create eb listener {id}: ")));
    assert!(message.contains("put rule target failed"));
    assert!(!message.contains("manually delete"));
    assert!(cloud.queue_names().is_empty());
    assert_eq!(cloud.rule_names(BUS), vec![SOURCE_RULE.to_owned()]);
    assert!(listener.components().is_empty());
}

#[rstest]
fn failed_rollback_surfaces_leaked_arns(cloud: Arc<MemoryCloud>) {
    cloud.fail_always("PutTargets", "denied");
    cloud.fail_always("DeleteQueue", "denied");
    let ctx = CallContext::new();
    let mut listener = Listener::new(clients(&cloud), &ctx, &spec(&[])).expect("preflight");
    let id = listener.id().to_string();

    let error = listener.create(&ctx).expect_err("binding fails");

    let ListenerError::Create { leaked, .. } = &error else {
        panic!("expected create error, got {error:?}");
    };
    assert_eq!(leaked, &vec![format!("arn:aws:sqs:us-east-1:123456789012:{id}")]);
    assert!(error.to_string().contains("please manually delete following resources"));
}

#[rstest]
fn unreadable_queue_arn_still_rolls_back_the_queue(cloud: Arc<MemoryCloud>) {
    cloud.fail_always("GetQueueAttributes", "throttled");
    let ctx = CallContext::new();
    let mut listener = Listener::new(clients(&cloud), &ctx, &spec(&[])).expect("preflight");

    let error = listener.create(&ctx).expect_err("attribute read fails");

    let ListenerError::Create { leaked, .. } = &error else {
        panic!("expected create error, got {error:?}");
    };
    assert!(leaked.is_empty());
    assert!(error.to_string().contains("failed to get attributes of queue"));
    assert!(cloud.queue_names().is_empty());
    assert_eq!(cloud.rule_names(BUS), vec![SOURCE_RULE.to_owned()]);
    assert!(listener.components().is_empty());
}

#[rstest]
fn unreadable_queue_arn_is_reported_when_its_rollback_fails(cloud: Arc<MemoryCloud>) {
    cloud.fail_always("GetQueueAttributes", "throttled");
    cloud.fail_always("DeleteQueue", "denied");
    let ctx = CallContext::new();
    let mut listener = Listener::new(clients(&cloud), &ctx, &spec(&[])).expect("preflight");
    let id = listener.id().to_string();

    let error = listener.create(&ctx).expect_err("attribute read fails");

    let ListenerError::Create { leaked, .. } = &error else {
        panic!("expected create error, got {error:?}");
    };
    assert_eq!(leaked, &vec![format!("arn:aws:sqs:us-east-1:123456789012:{id}")]);
    assert_eq!(cloud.queue_names(), vec![id]);
}

#[rstest]
fn cancelled_context_aborts_and_rolls_back_nothing(cloud: Arc<MemoryCloud>) {
    let ctx = CallContext::new();
    let mut listener = Listener::new(clients(&cloud), &ctx, &spec(&[])).expect("preflight");
    ctx.cancel();

    let error = listener.create(&ctx).expect_err("cancelled");

    assert!(error.to_string().contains("context cancelled"));
    assert_eq!(cloud.call_count("PutRule"), 1);
    assert_eq!(cloud.call_count("CreateQueue"), 0);
}

#[rstest]
fn get_rejects_malformed_ids_without_calls(cloud: Arc<MemoryCloud>) {
    let before = cloud.calls().len();

    let error = Listener::get(clients(&cloud), &CallContext::new(), "iatk_eb_short")
        .expect_err("invalid");

    assert_eq!(error.to_string(), "invalid ID");
    assert_eq!(cloud.calls().len(), before);
}

#[rstest]
fn get_then_destroy_removes_both_components(cloud: Arc<MemoryCloud>) {
    let id = created(&cloud, &[]);
    let ctx = CallContext::new();

    let mut listener = Listener::get(clients(&cloud), &ctx, &id).expect("get");
    assert!(listener.queue().is_some());
    assert!(listener.rule().is_some());

    listener.destroy(&ctx).expect("destroy");
    assert!(cloud.queue_names().is_empty());
    assert!(!cloud.rule_names(BUS).contains(&id));

    let calls = cloud.calls().len();
    listener.destroy(&ctx).expect("second destroy is a no-op");
    assert_eq!(cloud.calls().len(), calls);
}

#[rstest]
fn destroy_deletes_rule_before_queue(cloud: Arc<MemoryCloud>) {
    let id = created(&cloud, &[]);
    let ctx = CallContext::new();
    let mut listener = Listener::get(clients(&cloud), &ctx, &id).expect("get");

    listener.destroy(&ctx).expect("destroy");

    let calls = cloud.calls();
    let rule_deleted = calls.iter().position(|call| *call == "DeleteRule");
    let queue_deleted = calls.iter().position(|call| *call == "DeleteQueue");
    assert!(rule_deleted < queue_deleted);
    assert!(calls.contains(&"RemoveTargets"));
}

#[rstest]
fn get_without_rule_still_destroys_queue(cloud: Arc<MemoryCloud>) {
    let id = created(&cloud, &[]);
    let ctx = CallContext::new();
    cloud.fail_always("DescribeRule", "gone");

    let mut listener = Listener::get(clients(&cloud), &ctx, &id).expect("get");
    assert!(listener.rule().is_none());

    listener.destroy(&ctx).expect("destroy");
    assert!(cloud.queue_names().is_empty());
}

#[rstest]
fn destroy_multiple_aggregates_per_id_failures(cloud: Arc<MemoryCloud>) {
    let first = created(&cloud, &[]);
    let second = created(&cloud, &[]);
    let ids = vec![first.clone(), "bogus".to_owned(), second, first];

    let error = destroy_multiple(
        &clients(&cloud),
        &CallContext::new(),
        &ids,
        DestroyOptions { max_concurrency: 2 },
    )
    .expect_err("bogus id");

    assert_eq!(
        error.to_string(),
        "failed to destroy following listener(s): {resource group id: bogus, reason: invalid ID}"
    );
    assert!(cloud.queue_names().is_empty());
}

#[rstest]
fn destroy_multiple_joins_every_failure_in_input_order(cloud: Arc<MemoryCloud>) {
    let ids = vec!["bogus-1".to_owned(), "bogus-2".to_owned()];

    let error = destroy_multiple(&clients(&cloud), &CallContext::new(), &ids, DestroyOptions::default())
        .expect_err("bogus ids");

    assert_eq!(
        error.to_string(),
        concat!(
            "failed to destroy following listener(s): ",
            "{resource group id: bogus-1, reason: invalid ID}, ",
            "{resource group id: bogus-2, reason: invalid ID}"
        )
    );
}

#[rstest]
fn destroy_multiple_succeeds_for_valid_ids(cloud: Arc<MemoryCloud>) {
    let ids: Vec<String> = (0..7).map(|_| created(&cloud, &[])).collect();

    destroy_multiple(
        &clients(&cloud),
        &CallContext::new(),
        &ids,
        DestroyOptions::default(),
    )
    .expect("destroy all");

    assert!(cloud.queue_names().is_empty());
    assert_eq!(cloud.rule_names(BUS), vec![SOURCE_RULE.to_owned()]);
}

#[rstest]
fn destroy_by_tag_filters_only_touches_matching_listeners(cloud: Arc<MemoryCloud>) {
    let kept = created(&cloud, &[("team", "a")]);
    let removed = created(&cloud, &[("team", "b")]);
    let filters = [TagFilter::new("team", vec!["b".to_owned()])];

    destroy_with_tag_filters(
        &clients(&cloud),
        cloud.as_ref(),
        &CallContext::new(),
        &filters,
        DestroyOptions::default(),
    )
    .expect("destroy");

    let remaining = cloud.queue_names();
    assert!(remaining.contains(&kept));
    assert!(!remaining.contains(&removed));
}

#[rstest]
fn poll_returns_bodies_in_order_and_acknowledges_them(cloud: Arc<MemoryCloud>) {
    let id = created(&cloud, &[]);
    for body in ["one", "two", "three"] {
        assert!(cloud.send_message(&id, body));
    }
    let ctx = CallContext::new();
    let listener = Listener::get(clients(&cloud), &ctx, &id).expect("get");

    let events = listener.poll_events(&ctx, 2, 2).expect("poll");

    assert_eq!(events, vec!["one".to_owned(), "two".to_owned()]);
    assert_eq!(cloud.deleted_receipts().len(), 2);
    assert_eq!(cloud.pending_messages(&id), 1);
    let receive = cloud.receives().pop().expect("receive recorded");
    assert_eq!(receive.visibility_timeout, 7);
    assert_eq!(receive.wait_time_seconds, 2);
    assert_eq!(receive.max_number_of_messages, 2);
}

#[rstest]
fn empty_poll_sends_no_acknowledgement(cloud: Arc<MemoryCloud>) {
    let id = created(&cloud, &[]);
    let ctx = CallContext::new();
    let listener = Listener::get(clients(&cloud), &ctx, &id).expect("get");

    let events = listener.poll_events(&ctx, 0, 1).expect("poll");

    assert!(events.is_empty());
    assert_eq!(cloud.call_count("DeleteMessageBatch"), 0);
}

#[rstest]
fn user_tags_are_not_required(cloud: Arc<MemoryCloud>) {
    let id = created(&cloud, &[]);
    let tags: BTreeMap<String, String> = cloud.queue_tags(&id).expect("queue");
    assert_eq!(tags.len(), 4);
}
