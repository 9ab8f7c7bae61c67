//! Amazon Resource Name parsing and formatting.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Parsed Amazon Resource Name.
///
/// The textual form is `arn:<partition>:<service>:<region>:<account>:<resource>`.
/// The resource part may itself contain `:` or `/` separators and is kept
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Arn {
    /// Partition, for example `aws` or `aws-cn`.
    pub partition: String,
    /// Service namespace, for example `sqs` or `events`.
    pub service: String,
    /// Region code, empty for global resources.
    pub region: String,
    /// Owning account id, empty for some global resources.
    pub account_id: String,
    /// Service-specific resource path.
    pub resource: String,
}

/// Errors raised while parsing an [`Arn`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArnParseError {
    /// Input did not start with the `arn:` prefix.
    #[error("arn '{input}' does not start with 'arn:'")]
    MissingPrefix {
        /// Rejected input.
        input: String,
    },
    /// Input had fewer than six colon-separated sections.
    #[error("arn '{input}' has too few sections")]
    TooFewSections {
        /// Rejected input.
        input: String,
    },
}

impl Arn {
    /// Builds an ARN from its components.
    #[must_use]
    pub fn new(
        partition: impl Into<String>,
        service: impl Into<String>,
        region: impl Into<String>,
        account_id: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            partition: partition.into(),
            service: service.into(),
            region: region.into(),
            account_id: account_id.into(),
            resource: resource.into(),
        }
    }

    /// Returns a sibling ARN in the same partition, region and account but for
    /// another service and resource.
    #[must_use]
    pub fn sibling(&self, service: &str, resource: &str) -> Self {
        Self::new(
            self.partition.as_str(),
            service,
            self.region.as_str(),
            self.account_id.as_str(),
            resource,
        )
    }
}

impl FromStr for Arn {
    type Err = ArnParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let Some(rest) = input.strip_prefix("arn:") else {
            return Err(ArnParseError::MissingPrefix {
                input: input.to_owned(),
            });
        };
        let mut sections = rest.splitn(5, ':');
        let mut next = || {
            sections
                .next()
                .map(str::to_owned)
                .ok_or_else(|| ArnParseError::TooFewSections {
                    input: input.to_owned(),
                })
        };
        Ok(Self {
            partition: next()?,
            service: next()?,
            region: next()?,
            account_id: next()?,
            resource: next()?,
        })
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}
