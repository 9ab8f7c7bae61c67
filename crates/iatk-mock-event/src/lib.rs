//! Mock event generation from registered or local schemas.
//!
//! A [`Schema`] is loaded from the schema registry or from a file, then
//! [`generate`] walks its properties and fills each with a placeholder of the
//! declared type. [`apply_overrides`] lets callers pin specific values in the
//! generated event.

pub mod generate;
pub mod overrides;
pub mod schema;

pub use generate::{GenerateError, MAX_DEPTH, generate};
pub use overrides::{OverrideError, apply_overrides};
pub use schema::{Schema, SchemaError, SchemaType};
