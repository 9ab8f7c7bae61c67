//! Call context threaded through every cloud API call.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{ApiError, ApiErrorKind};

/// Deadline and cancellation carried by every cloud call.
///
/// Clones share the cancellation flag, so cancelling any clone aborts the
/// next call made through every other clone.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl CallContext {
    /// Creates a context with no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context that expires after `timeout`.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Marks the context as cancelled.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Checks whether a call may proceed.
    ///
    /// Client implementations call this before issuing each request.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] tagged with the service and operation when the
    /// context was cancelled or its deadline passed.
    pub fn check(&self, service: &'static str, operation: &'static str) -> Result<(), ApiError> {
        let kind = if self.is_cancelled() {
            ApiErrorKind::Cancelled
        } else if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            ApiErrorKind::DeadlineExceeded
        } else {
            return Ok(());
        };
        Err(ApiError {
            service,
            operation,
            kind,
        })
    }
}
