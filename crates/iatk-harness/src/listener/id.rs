//! Listener identifiers.

use std::fmt;

use time::OffsetDateTime;

/// Prefix every listener id starts with.
pub const ID_PREFIX: &str = "iatk_eb_";

/// Length of the opaque suffix following [`ID_PREFIX`].
pub const SUFFIX_LEN: usize = 20;

const ALPHABET: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

/// Validated listener id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(String);

/// Error returned for strings that are not listener ids.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid ID")]
pub struct InvalidListenerId;

impl ListenerId {
    /// Generates a fresh id from the current time and 64 random bits.
    #[must_use]
    pub fn generate() -> Self {
        let seconds = u32::try_from(OffsetDateTime::now_utc().unix_timestamp()).unwrap_or(u32::MAX);
        let random: u64 = rand::random();
        let raw = (u128::from(seconds) << 64) | u128::from(random);
        Self(format!("{ID_PREFIX}{}", encode(raw)))
    }

    /// Validates `candidate` as a listener id.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidListenerId`] unless `candidate` is the prefix followed
    /// by [`SUFFIX_LEN`] characters from the id alphabet.
    pub fn parse(candidate: &str) -> Result<Self, InvalidListenerId> {
        if is_valid_id(candidate) {
            Ok(Self(candidate.to_owned()))
        } else {
            Err(InvalidListenerId)
        }
    }

    /// Returns the full id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ListenerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returns `true` when `candidate` is a well-formed listener id.
#[must_use]
pub fn is_valid_id(candidate: &str) -> bool {
    candidate.strip_prefix(ID_PREFIX).is_some_and(|suffix| {
        suffix.len() == SUFFIX_LEN && suffix.bytes().all(|byte| ALPHABET.contains(&byte))
    })
}

/// Encodes 96 bits as 20 base32hex digits, most significant first.
fn encode(raw: u128) -> String {
    let padded = raw << 4;
    (0..SUFFIX_LEN)
        .rev()
        .map(|position| {
            let digit = (padded >> (5 * position)) & 0x1f;
            let index = usize::try_from(digit).unwrap_or_default();
            ALPHABET.get(index).copied().map_or('0', char::from)
        })
        .collect()
}
