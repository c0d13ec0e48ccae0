//! Encoding helpers used when building payloads for injection.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use resource_core::Parameter;

/// `quote` keeps `/` like a path segment separator.
const PATH_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'/');

/// Everything `PATH_ESCAPE` keeps plus the sub-delimiters a payload may need
/// to send raw. `&`, `=`, `#` and quotes are always escaped.
const PAYLOAD_ESCAPE: &AsciiSet = &PATH_ESCAPE
    .remove(b'%')
    .remove(b'[')
    .remove(b']')
    .remove(b':')
    .remove(b';')
    .remove(b'$')
    .remove(b'(')
    .remove(b')')
    .remove(b'+')
    .remove(b',')
    .remove(b'!')
    .remove(b'?')
    .remove(b'*');

/// Percent-encode special characters, keeping `/`.
pub fn quote(s: &str) -> String {
    utf8_percent_encode(s, PATH_ESCAPE).to_string()
}

/// Encode parameters into a query string, leaving payload punctuation
/// readable. A flag renders as `key=`.
pub fn encode(params: &[Parameter]) -> String {
    params
        .iter()
        .map(|p| {
            format!(
                "{}={}",
                utf8_percent_encode(&p.key, PAYLOAD_ESCAPE),
                utf8_percent_encode(p.value.as_deref().unwrap_or_default(), PAYLOAD_ESCAPE)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}
