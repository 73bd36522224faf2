//! Continuous access evaluation challenge detection.
//!
//! A `401` whose `WWW-Authenticate` header is a Bearer challenge carrying
//! `claims="<value>"` asks the client to re-authenticate with those claims and
//! retry once. The first `claims="..."` occurrence is authoritative; escaped
//! quotes are not supported. Any other challenge on a `401` is malformed.

use std::sync::LazyLock;

use abstractions::{AdapterError, HttpResponse};
use regex::Regex;

pub(crate) const RESPONSE_AUTH_HEADER: &str = "WWW-Authenticate";
const BEARER_AUTHENTICATION_SCHEME: &str = "Bearer";

static CLAIMS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"claims="([^"]+)""#).expect("claims pattern is valid"));

/// Returns the claims to retry with, if `response` is a claims challenge.
///
/// `Ok(None)` means "no retry": the status is not `401` or the header is
/// absent.
///
/// # Errors
///
/// [`AdapterError::ClaimsParse`] when the header is not a Bearer challenge
/// carrying a claims value.
pub(crate) fn claims_from_challenge(response: &HttpResponse) -> Result<Option<String>, AdapterError> {
    if response.status != 401 {
        return Ok(None);
    }
    let Some(header) = response.headers.get(RESPONSE_AUTH_HEADER) else {
        return Ok(None);
    };
    is_bearer_challenge(header)
        .then(|| CLAIMS_PATTERN.captures(header))
        .flatten()
        .map(|captures| Some(captures[1].to_string()))
        .ok_or_else(|| AdapterError::ClaimsParse {
            header: header.to_string(),
        })
}

fn is_bearer_challenge(header: &str) -> bool {
    header
        .trim_start()
        .get(..BEARER_AUTHENTICATION_SCHEME.len())
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case(BEARER_AUTHENTICATION_SCHEME))
}
