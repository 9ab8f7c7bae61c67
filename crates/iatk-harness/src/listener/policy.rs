//! Queue access policy granting a single rule send rights.

use std::fmt;

use iatk_cloud::Arn;
use serde_json::Value;

/// Access policy letting only `rule_arn` send to `queue_arn`.
///
/// The queue ARN is predicted before the queue exists so the policy can be
/// applied in the creating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuePolicy {
    /// ARN the queue will have once created.
    pub queue_arn: Arn,
    /// ARN of the only permitted sender.
    pub rule_arn: Arn,
}

impl QueuePolicy {
    /// Predicts the ARN of queue `name` in the partition, region and account
    /// of `event_bus_arn`.
    #[must_use]
    pub fn predicted_queue_arn(event_bus_arn: &Arn, name: &str) -> Arn {
        event_bus_arn.sibling("sqs", name)
    }
}

impl fmt::Display for QueuePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = Value::String(self.queue_arn.to_string());
        let rule = Value::String(self.rule_arn.to_string());
        write!(
            f,
            concat!(
                r#"{{"Version": "2012-10-17", "Id": "Write_Permission_for_Rule_{}", "Statement": ["#,
                r#"{{"Sid": "eblistener", "Effect": "Allow", "Principal": {{"Service": "events.amazonaws.com"}}, "#,
                r#""Action": "sqs:SendMessage", "Resource": {}, "#,
                r#""Condition": {{"ArnEquals": {{"aws:SourceArn": {}}}}}}}]}}"#,
            ),
            self.rule_arn.resource, queue, rule
        )
    }
}
