//! SQS client contract.

use std::collections::BTreeMap;

use crate::context::CallContext;
use crate::error::ApiError;

/// Service name recorded on SQS errors.
pub const SERVICE: &str = "SQS";

/// Queue attribute holding the access policy document.
pub const ATTRIBUTE_POLICY: &str = "Policy";
/// Queue attribute holding the retention period in seconds.
pub const ATTRIBUTE_MESSAGE_RETENTION_PERIOD: &str = "MessageRetentionPeriod";
/// Queue attribute holding the queue ARN.
pub const ATTRIBUTE_QUEUE_ARN: &str = "QueueArn";

/// Arguments to `CreateQueue`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateQueueRequest {
    /// Queue name.
    pub name: String,
    /// Tags applied atomically with creation.
    pub tags: BTreeMap<String, String>,
    /// Queue attributes such as [`ATTRIBUTE_POLICY`].
    pub attributes: BTreeMap<String, String>,
}

/// Arguments to `ReceiveMessage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveMessageRequest<'a> {
    /// Queue URL.
    pub queue_url: &'a str,
    /// Upper bound on returned messages.
    pub max_number_of_messages: i32,
    /// Long-poll duration.
    pub wait_time_seconds: i32,
    /// Seconds the received messages stay hidden from other consumers.
    pub visibility_timeout: i32,
}

/// Message returned by `ReceiveMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    /// Service assigned message id.
    pub message_id: String,
    /// Message payload.
    pub body: String,
    /// Handle used to acknowledge the message.
    pub receipt_handle: String,
}

/// Entry of a `DeleteMessageBatch` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteMessageBatchEntry {
    /// Caller chosen id, unique within the batch.
    pub id: String,
    /// Receipt handle of the message to delete.
    pub receipt_handle: String,
}

/// Operations used against SQS.
pub trait SqsApi: Send + Sync {
    /// Creates a queue and returns its URL.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the service rejects the queue.
    fn create_queue(&self, ctx: &CallContext, request: &CreateQueueRequest)
    -> Result<String, ApiError>;

    /// Reads the requested attributes of a queue.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the queue does not exist or the call fails.
    fn get_queue_attributes(
        &self,
        ctx: &CallContext,
        queue_url: &str,
        names: &[&str],
    ) -> Result<BTreeMap<String, String>, ApiError>;

    /// Resolves a queue name to its URL.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when no such queue exists.
    fn get_queue_url(&self, ctx: &CallContext, name: &str) -> Result<String, ApiError>;

    /// Reads the tags attached to a queue.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the queue does not exist or the call fails.
    fn list_queue_tags(
        &self,
        ctx: &CallContext,
        queue_url: &str,
    ) -> Result<BTreeMap<String, String>, ApiError>;

    /// Deletes a queue.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the call fails.
    fn delete_queue(&self, ctx: &CallContext, queue_url: &str) -> Result<(), ApiError>;

    /// Receives up to `max_number_of_messages` messages.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the call fails.
    fn receive_message(
        &self,
        ctx: &CallContext,
        request: ReceiveMessageRequest<'_>,
    ) -> Result<Vec<Message>, ApiError>;

    /// Deletes messages by receipt handle.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the call fails.
    fn delete_message_batch(
        &self,
        ctx: &CallContext,
        queue_url: &str,
        entries: &[DeleteMessageBatchEntry],
    ) -> Result<(), ApiError>;
}
