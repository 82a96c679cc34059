//! Canonical request construction for AWS Signature Version 4.
//!
//! This module implements the canonical request format as specified by AWS:
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n
//! SignedHeaders\n
//! HashedPayload
//! ```
//!
//! Every component is produced byte-exact: a different escape, ordering, or
//! casing yields a signature the object store rejects.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters that are percent-encoded by [`uri_encode`].
///
/// Everything except RFC 3986 unreserved characters (A-Z, a-z, 0-9, `-`, `_`,
/// `.`, `~`) is encoded, which includes `!`, `'`, `(`, `)` and `*`.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a single value using the RFC 3986 rules required by SigV4.
///
/// # Examples
///
/// ```
/// use rustdrop_auth::canonical::uri_encode;
///
/// assert_eq!(uri_encode("a b"), "a%20b");
/// assert_eq!(uri_encode("it's(1)*!"), "it%27s%281%29%2A%21");
/// assert_eq!(uri_encode("AKID/20240101"), "AKID%2F20240101");
/// ```
#[must_use]
pub fn uri_encode(input: &str) -> String {
    utf8_percent_encode(input, URI_ENCODE_SET).to_string()
}

/// Encode a `/`-delimited path, encoding each segment and keeping the slashes.
///
/// # Examples
///
/// ```
/// use rustdrop_auth::canonical::encode_path;
///
/// assert_eq!(encode_path("/bucket/my photo.png"), "/bucket/my%20photo.png");
/// assert_eq!(encode_path("user_42/a(1).png"), "user_42/a%281%29.png");
/// ```
#[must_use]
pub fn encode_path(path: &str) -> String {
    path.split('/').map(uri_encode).collect::<Vec<_>>().join("/")
}

/// Build the canonical URI for an object addressed path-style on an endpoint.
///
/// The endpoint's own path (with trailing slashes removed), the bucket and the
/// object key are joined, runs of slashes are collapsed, a leading `/` is
/// ensured and each segment is encoded with [`uri_encode`].
///
/// # Examples
///
/// ```
/// use rustdrop_auth::canonical::build_canonical_uri;
///
/// assert_eq!(build_canonical_uri("/", "uploads", "u/cat.png"), "/uploads/u/cat.png");
/// assert_eq!(build_canonical_uri("/base/", "b", "k"), "/base/b/k");
/// ```
#[must_use]
pub fn build_canonical_uri(endpoint_path: &str, bucket: &str, key: &str) -> String {
    let base = endpoint_path.trim_end_matches('/');
    let joined = collapse_slashes(&format!("{base}/{bucket}/{key}"));
    if joined.starts_with('/') {
        encode_path(&joined)
    } else {
        encode_path(&format!("/{joined}"))
    }
}

/// Build the canonical query string from unencoded parameter pairs.
///
/// Keys and values are encoded with [`uri_encode`], then sorted byte-wise by
/// encoded key and, on ties, by encoded value.
///
/// # Examples
///
/// ```
/// use rustdrop_auth::canonical::build_canonical_query_string;
///
/// assert_eq!(build_canonical_query_string(&[]), "");
/// assert_eq!(
///     build_canonical_query_string(&[("b", "2"), ("a", "x/y")]),
///     "a=x%2Fy&b=2"
/// );
/// ```
#[must_use]
pub fn build_canonical_query_string(params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (uri_encode(k), uri_encode(v)))
        .collect();

    encoded.sort_unstable();

    encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the canonical headers block.
///
/// Header names are lower-cased, values trimmed with inner whitespace runs
/// collapsed to one space, entries sorted by name. Every entry, including the
/// last, is terminated by `\n`.
///
/// # Examples
///
/// ```
/// use rustdrop_auth::canonical::build_canonical_headers;
///
/// let block = build_canonical_headers(&[("Host", "r2.example.com"), ("Content-Type", " image/png ")]);
/// assert_eq!(block, "content-type:image/png\nhost:r2.example.com\n");
/// ```
#[must_use]
pub fn build_canonical_headers(headers: &[(&str, &str)]) -> String {
    let mut entries: Vec<(String, String)> = headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), normalize_header_value(value)))
        .collect();

    entries.sort_unstable();

    entries
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect()
}

/// Build the signed headers string: sorted, lower-cased names joined by `;`.
///
/// # Examples
///
/// ```
/// use rustdrop_auth::canonical::build_signed_headers_string;
///
/// assert_eq!(build_signed_headers_string(&["host", "Content-Type"]), "content-type;host");
/// ```
#[must_use]
pub fn build_signed_headers_string(names: &[&str]) -> String {
    let mut sorted: Vec<String> = names.iter().map(|n| n.to_ascii_lowercase()).collect();
    sorted.sort_unstable();
    sorted.join(";")
}

/// Assemble the canonical request from already-canonical components.
#[must_use]
pub fn build_canonical_request(
    method: &str,
    canonical_uri: &str,
    canonical_query: &str,
    canonical_headers: &str,
    signed_headers: &str,
    payload_hash: &str,
) -> String {
    format!(
        "{method}\n{canonical_uri}\n{canonical_query}\n{canonical_headers}\n{signed_headers}\n{payload_hash}"
    )
}

/// Trim a header value and collapse consecutive whitespace to a single space.
#[must_use]
pub fn normalize_header_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut prev_was_space = false;
    for ch in value.trim().chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            result.push(ch);
            prev_was_space = false;
        }
    }
    result
}

fn collapse_slashes(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut prev_was_slash = false;
    for ch in path.chars() {
        if ch == '/' {
            if !prev_was_slash {
                result.push(ch);
            }
            prev_was_slash = true;
        } else {
            result.push(ch);
            prev_was_slash = false;
        }
    }
    result
}
