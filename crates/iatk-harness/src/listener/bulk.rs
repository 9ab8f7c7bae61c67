//! Bulk teardown of listeners.

use std::thread;

use iatk_cloud::CallContext;
use iatk_cloud::tagging::{TagFilter, TaggingApi};

use super::{DestroyFailure, LISTENER_TARGET, Listener, ListenerClients, ListenerError};
use crate::dedup::dedup;
use crate::drivers::tagging;

/// Default number of listeners destroyed concurrently.
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// Options for [`destroy_multiple`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestroyOptions {
    /// Upper bound on listeners destroyed at the same time.
    pub max_concurrency: usize,
}

impl Default for DestroyOptions {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

/// Destroys every listener in `ids`, collecting one failure per id instead of
/// stopping at the first.
///
/// Duplicate ids are destroyed once. Listeners are processed in batches of
/// at most `options.max_concurrency` scoped threads; within one listener the
/// rule is still deleted before the queue.
///
/// # Errors
///
/// Returns [`ListenerError::DestroyMultiple`] listing every id that could not
/// be read back or destroyed.
pub fn destroy_multiple(
    clients: &ListenerClients,
    ctx: &CallContext,
    ids: &[String],
    options: DestroyOptions,
) -> Result<(), ListenerError> {
    let distinct = dedup(ids);
    tracing::info!(target: LISTENER_TARGET, listeners = ?distinct, "destroying listeners");
    let mut failures = Vec::new();
    for batch in distinct.chunks(options.max_concurrency.max(1)) {
        let outcomes: Vec<_> = thread::scope(|scope| {
            let workers: Vec<_> = batch
                .iter()
                .map(|id| scope.spawn(move || destroy_one(clients, ctx, id)))
                .collect();
            workers.into_iter().map(thread::ScopedJoinHandle::join).collect()
        });
        for (id, outcome) in batch.iter().zip(outcomes) {
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(failure)) => failures.push(failure),
                Err(_) => failures.push(DestroyFailure {
                    id: id.clone(),
                    reason: "destroy worker panicked".to_owned(),
                }),
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(ListenerError::DestroyMultiple { failures })
    }
}

/// Destroys every listener owning a resource that matches `filters`.
///
/// # Errors
///
/// Returns [`ListenerError::TagFilters`] when the ids cannot be resolved, or
/// the [`destroy_multiple`] failure.
pub fn destroy_with_tag_filters(
    clients: &ListenerClients,
    tagging_api: &dyn TaggingApi,
    ctx: &CallContext,
    filters: &[TagFilter],
    options: DestroyOptions,
) -> Result<(), ListenerError> {
    let ids = tagging::harness_ids_with_tag_filters(tagging_api, ctx, filters)
        .map_err(|source| ListenerError::TagFilters {
            source: Box::new(source),
        })?;
    destroy_multiple(clients, ctx, &ids, options)
}

fn destroy_one(
    clients: &ListenerClients,
    ctx: &CallContext,
    id: &str,
) -> Result<(), DestroyFailure> {
    let failure = |error: &ListenerError| {
        tracing::warn!(target: LISTENER_TARGET, listener = id, %error, "destroy failed");
        DestroyFailure {
            id: id.to_owned(),
            reason: error.to_string(),
        }
    };
    let mut listener = Listener::get(clients.clone(), ctx, id).map_err(|error| failure(&error))?;
    listener.destroy(ctx).map_err(|error| {
        tracing::warn!(
            target: LISTENER_TARGET,
            listener = id,
            resources = ?listener.components(),
            "delete the listed resources manually"
        );
        failure(&error)
    })
}
