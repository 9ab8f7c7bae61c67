//! Typed contracts for the cloud services driven by the toolkit.
//!
//! Each service is described by a narrow, synchronous trait that takes a
//! [`CallContext`] so deadlines and cancellation reach every call. A
//! [`CloudProvider`] builds a [`CloudClients`] bundle for one region, profile
//! and user agent. Enabling the `test-support` feature exposes
//! [`memory::MemoryCloud`], an in-process implementation of every trait.

pub mod arn;
pub mod cloudformation;
pub mod context;
pub mod error;
pub mod eventbridge;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod provider;
pub mod schemas;
pub mod sqs;
pub mod tagging;
pub mod xray;

pub use arn::{Arn, ArnParseError};
pub use context::CallContext;
pub use error::{ApiError, ApiErrorKind};
pub use provider::{ClientSettings, CloudClients, CloudProvider, ProviderError, UnavailableProvider};
