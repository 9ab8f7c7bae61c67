//! Errors surfaced by cloud client implementations.

use thiserror::Error;

/// Failure reported by a cloud API call.
///
/// Every error records the service and operation that produced it so callers
/// can wrap it with resource context without losing the origin.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to call service: {service}, operation: {operation}, error: {kind}")]
pub struct ApiError {
    /// Service name, for example `SQS` or `EventBridge`.
    pub service: &'static str,
    /// Operation name, for example `CreateQueue`.
    pub operation: &'static str,
    /// Failure classification and message.
    pub kind: ApiErrorKind,
}

/// Classification of an [`ApiError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiErrorKind {
    /// The service rejected the call.
    #[error("{code}: {message}")]
    Service {
        /// Service error code, for example `ResourceNotFoundException`.
        code: String,
        /// Human-readable message from the service.
        message: String,
    },
    /// The call was not attempted because the context was cancelled.
    #[error("context cancelled")]
    Cancelled,
    /// The call was not attempted because the context deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
    /// No backend is available to serve the call.
    #[error("backend unavailable: {message}")]
    Unavailable {
        /// Reason the backend could not be reached.
        message: String,
    },
}

impl ApiError {
    /// Creates a service-side error.
    #[must_use]
    pub fn service(
        service: &'static str,
        operation: &'static str,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            service,
            operation,
            kind: ApiErrorKind::Service {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    /// Creates a not-found style error with the conventional code.
    #[must_use]
    pub fn not_found(
        service: &'static str,
        operation: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::service(service, operation, "ResourceNotFoundException", message)
    }

    /// Creates an unavailable-backend error.
    #[must_use]
    pub fn unavailable(
        service: &'static str,
        operation: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            service,
            operation,
            kind: ApiErrorKind::Unavailable {
                message: message.into(),
            },
        }
    }

    /// Returns the service error code when the service rejected the call.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match &self.kind {
            ApiErrorKind::Service { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }

    /// Returns `true` when the call was aborted by its context.
    #[must_use]
    pub const fn is_context_error(&self) -> bool {
        matches!(
            self.kind,
            ApiErrorKind::Cancelled | ApiErrorKind::DeadlineExceeded
        )
    }
}
