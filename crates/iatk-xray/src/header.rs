//! Tracing header parsing.

use thiserror::Error;

/// The header carried no usable root trace id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid tracing header provided")]
pub struct HeaderError;

/// Extracts the root trace id from a tracing header such as
/// `Root=1-5759e988-bd862e3fe1be46a994272793;Parent=53995c3f42cd8ad8;Sampled=1`.
///
/// The header is split on `;` and each component on `=`. The first component
/// whose key is `root` in any case yields the id.
///
/// # Errors
///
/// Returns [`HeaderError`] when no root component exists or its value is
/// empty.
///
/// # Examples
///
/// ```
/// use iatk_xray::trace_id_from_header;
///
/// let id = trace_id_from_header("Root=1-abc;Sampled=1").expect("root id");
/// assert_eq!(id, "1-abc");
/// assert!(trace_id_from_header("Root=;").is_err());
/// ```
pub fn trace_id_from_header(header: &str) -> Result<String, HeaderError> {
    for component in header.split(';') {
        let mut parts = component.trim().splitn(2, '=');
        let key = parts.next().unwrap_or_default();
        if !key.trim().eq_ignore_ascii_case("root") {
            continue;
        }
        return match parts.next().map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value.to_owned()),
            _ => Err(HeaderError),
        };
    }
    Err(HeaderError)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("Root=1-5759e988-bd862e3fe1be46a994272793", "1-5759e988-bd862e3fe1be46a994272793")]
    #[case("root=1-abc;Parent=53995c3f42cd8ad8;Sampled=1", "1-abc")]
    #[case("Parent=53995c3f42cd8ad8; Root=1-def ;Sampled=1", "1-def")]
    #[case("ROOT=1-ghi", "1-ghi")]
    fn extracts_root(#[case] header: &str, #[case] expected: &str) {
        assert_eq!(trace_id_from_header(header), Ok(expected.to_owned()));
    }

    #[rstest]
    #[case("Root=;")]
    #[case("Root")]
    #[case("Parent=53995c3f42cd8ad8;Sampled=1")]
    #[case("not a header")]
    fn rejects_headers_without_root(#[case] header: &str) {
        let error = trace_id_from_header(header).expect_err("must fail");
        assert_eq!(error.to_string(), "invalid tracing header provided");
    }
}
