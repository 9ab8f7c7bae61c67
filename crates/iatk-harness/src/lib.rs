//! Test-harness resources built on the managed event bus.
//!
//! The crate provides narrow drivers for queues, rules, event buses and tag
//! queries, the reserved tag vocabulary shared by every harness-owned
//! resource, and the listener lifecycle engine that composes those drivers
//! into a capture apparatus with rollback and bulk teardown.

pub mod dedup;
pub mod drivers;
pub mod listener;
pub mod resource;
pub mod tags;

pub use dedup::dedup;
pub use drivers::DriverError;
pub use listener::{
    DestroyFailure, DestroyOptions, Listener, ListenerClients, ListenerError, ListenerId,
    ListenerOutput, ListenerSpec, destroy_multiple, destroy_with_tag_filters, is_valid_id,
};
pub use resource::{Resource, ResourceType};
pub use tags::{SystemTagKey, TagError, validate_tags};

#[cfg(test)]
mod tests;
