//! Reserved tag vocabulary for harness-owned resources.

use std::collections::BTreeMap;

use thiserror::Error;
use time::OffsetDateTime;
use time::macros::format_description;

/// Namespace shared by every reserved key.
pub const RESERVED_NAMESPACE: &str = "iatk:TestHarness:";

/// Reserved keys written on every harness-owned resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemTagKey {
    /// Listener id.
    Id,
    /// Harness type string.
    Type,
    /// ARN of the resource under test.
    Target,
    /// Creation timestamp, RFC 3339 UTC with second precision.
    Created,
}

impl SystemTagKey {
    /// Every reserved key, in validation order.
    pub const ALL: [Self; 4] = [Self::Id, Self::Type, Self::Target, Self::Created];

    /// Returns the full tag key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "iatk:TestHarness:ID",
            Self::Type => "iatk:TestHarness:Type",
            Self::Target => "iatk:TestHarness:Target",
            Self::Created => "iatk:TestHarness:Created",
        }
    }

    /// Returns the reserved key equal to `key`, if any.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|candidate| candidate.as_str() == key)
    }
}

impl std::fmt::Display for SystemTagKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while validating caller-supplied tags.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    /// Caller tried to write a reserved key.
    #[error("reserved tag key \"{key}\" found in provided tags")]
    ReservedKey {
        /// Offending key.
        key: SystemTagKey,
    },
}

/// Rejects tag sets that contain any reserved key.
///
/// # Errors
///
/// Returns [`TagError::ReservedKey`] naming the first reserved key found.
pub fn validate_tags(tags: &BTreeMap<String, String>) -> Result<(), TagError> {
    match SystemTagKey::ALL
        .into_iter()
        .find(|key| tags.contains_key(key.as_str()))
    {
        Some(key) => Err(TagError::ReservedKey { key }),
        None => Ok(()),
    }
}

/// Formats a creation timestamp the way the `Created` tag stores it.
#[must_use]
pub fn format_created(timestamp: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");
    timestamp
        .to_offset(time::UtcOffset::UTC)
        .format(format)
        .unwrap_or_default()
}

/// Builds the full tag set for a harness resource: user tags overlaid with
/// the reserved keys.
#[must_use]
pub fn system_tags(
    id: &str,
    harness_type: &str,
    target_arn: &str,
    created: OffsetDateTime,
    user_tags: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut tags = user_tags.clone();
    tags.insert(SystemTagKey::Id.as_str().to_owned(), id.to_owned());
    tags.insert(SystemTagKey::Type.as_str().to_owned(), harness_type.to_owned());
    tags.insert(SystemTagKey::Target.as_str().to_owned(), target_arn.to_owned());
    tags.insert(
        SystemTagKey::Created.as_str().to_owned(),
        format_created(created),
    );
    tags
}
