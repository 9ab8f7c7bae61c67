//! Resource Groups Tagging client contract.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::context::CallContext;
use crate::error::ApiError;

/// Service name recorded on tagging errors.
pub const SERVICE: &str = "ResourceGroupsTaggingAPI";

/// Tag filter as accepted on the wire and by `GetResources`.
///
/// An empty `values` list matches any value of `key`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct TagFilter {
    /// Tag key.
    pub key: String,
    /// Accepted values.
    #[serde(default)]
    pub values: Vec<String>,
}

impl TagFilter {
    /// Creates a filter on `key` accepting any of `values`.
    #[must_use]
    pub fn new(key: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            key: key.into(),
            values,
        }
    }

    /// Returns `true` when `tags` satisfy this filter.
    #[must_use]
    pub fn matches(&self, tags: &BTreeMap<String, String>) -> bool {
        tags.get(&self.key)
            .is_some_and(|value| self.values.is_empty() || self.values.contains(value))
    }
}

/// Resource and its tags.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceTagMapping {
    /// Resource ARN.
    pub resource_arn: String,
    /// Tags on the resource.
    pub tags: BTreeMap<String, String>,
}

/// One page of `GetResources`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourcePage {
    /// Resources on this page.
    pub mappings: Vec<ResourceTagMapping>,
    /// Token for the next page, absent on the last page.
    pub pagination_token: Option<String>,
}

/// Operations used against the tagging API.
pub trait TaggingApi: Send + Sync {
    /// Lists one page of resources matching every filter.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the call fails.
    fn get_resources(
        &self,
        ctx: &CallContext,
        filters: &[TagFilter],
        pagination_token: Option<&str>,
    ) -> Result<ResourcePage, ApiError>;
}
