//! Presigned URL verification.
//!
//! Recomputes the signature of a presigned request from its method, URI and
//! headers and compares it with the `X-Amz-Signature` query parameter. This is
//! the same check an S3-compatible store performs when it receives the PUT.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use percent_encoding::percent_decode_str;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::canonical::{
    build_canonical_headers, build_canonical_query_string, build_canonical_request,
    build_signed_headers_string,
};
use crate::error::AuthError;
use crate::presigned::{Credentials, MAX_EXPIRES_SECS, UNSIGNED_PAYLOAD};
use crate::sigv4::{
    ALGORITHM, AMZ_DATE_FORMAT, SCOPE_TERMINATOR, build_string_to_sign, compute_signature,
    credential_scope, derive_signing_key, hash_canonical_request,
};

/// Name of the query parameter carrying the signature.
const SIGNATURE_PARAM: &str = "X-Amz-Signature";

/// Parsed components from presigned URL query parameters.
#[derive(Debug, Clone)]
pub struct ParsedPresignedParams {
    /// The access key ID.
    pub access_key_id: String,
    /// The date component of the credential scope (YYYYMMDD).
    pub date: String,
    /// The region from the credential scope.
    pub region: String,
    /// The service from the credential scope.
    pub service: String,
    /// The ISO 8601 basic format timestamp.
    pub timestamp: String,
    /// The URL validity duration in seconds.
    pub expires: u64,
    /// The list of signed header names.
    pub signed_headers: Vec<String>,
    /// The hex-encoded signature.
    pub signature: String,
}

/// Parse presigned URL query parameters into their components.
pub fn parse_presigned_params(query: &str) -> Result<ParsedPresignedParams, AuthError> {
    let params: HashMap<String, String> = query
        .split('&')
        .filter(|s| !s.is_empty())
        .filter_map(|param| {
            let (key, value) = param.split_once('=')?;
            Some((url_decode(key), url_decode(value)))
        })
        .collect();

    let algorithm = get_required_param(&params, "X-Amz-Algorithm")?;
    if algorithm != ALGORITHM {
        return Err(AuthError::UnsupportedAlgorithm(algorithm));
    }

    let credential = get_required_param(&params, "X-Amz-Credential")?;
    let timestamp = get_required_param(&params, "X-Amz-Date")?;
    let expires_str = get_required_param(&params, "X-Amz-Expires")?;
    let signed_headers_str = get_required_param(&params, "X-Amz-SignedHeaders")?;
    let signature = get_required_param(&params, SIGNATURE_PARAM)?;

    let cred_parts: Vec<&str> = credential.splitn(5, '/').collect();
    if cred_parts.len() != 5 || cred_parts[4] != SCOPE_TERMINATOR {
        return Err(AuthError::InvalidCredential);
    }

    let expires: u64 = expires_str
        .parse()
        .map_err(|_| AuthError::MalformedQueryParam("X-Amz-Expires (invalid integer)".to_owned()))?;
    if expires > MAX_EXPIRES_SECS {
        return Err(AuthError::MalformedQueryParam(format!(
            "X-Amz-Expires must be at most {MAX_EXPIRES_SECS}"
        )));
    }

    Ok(ParsedPresignedParams {
        access_key_id: cred_parts[0].to_owned(),
        date: cred_parts[1].to_owned(),
        region: cred_parts[2].to_owned(),
        service: cred_parts[3].to_owned(),
        timestamp,
        expires,
        signed_headers: signed_headers_str
            .split(';')
            .map(ToOwned::to_owned)
            .collect(),
        signature,
    })
}

/// Verify a presigned request against `credentials` at time `now`.
///
/// `headers` must contain every header named in `X-Amz-SignedHeaders`
/// (the `host` header included).
///
/// # Errors
///
/// Returns an [`AuthError`] if the query is malformed, the URL has expired,
/// the access key differs, a signed header is missing, or the signature does
/// not match.
pub fn verify_presigned(
    method: &http::Method,
    uri: &http::Uri,
    headers: &http::HeaderMap,
    credentials: &Credentials,
    now: DateTime<Utc>,
) -> Result<ParsedPresignedParams, AuthError> {
    let query = uri.query().unwrap_or("");
    let parsed = parse_presigned_params(query)?;

    debug!(
        access_key_id = %parsed.access_key_id,
        date = %parsed.date,
        region = %parsed.region,
        service = %parsed.service,
        expires = parsed.expires,
        "verifying presigned URL"
    );

    if parsed.access_key_id != credentials.access_key_id {
        return Err(AuthError::AccessKeyMismatch(parsed.access_key_id));
    }

    check_expiration(&parsed.timestamp, parsed.expires, now)?;

    let pairs = decoded_query_without_signature(query);
    let pair_refs: Vec<(&str, &str)> = pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    let canonical_query = build_canonical_query_string(&pair_refs);

    let header_pairs = collect_signed_headers(headers, &parsed.signed_headers)?;
    let header_refs: Vec<(&str, &str)> = header_pairs
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let signed_refs: Vec<&str> = parsed.signed_headers.iter().map(String::as_str).collect();

    let canonical_request = build_canonical_request(
        method.as_str(),
        uri.path(),
        &canonical_query,
        &build_canonical_headers(&header_refs),
        &build_signed_headers_string(&signed_refs),
        UNSIGNED_PAYLOAD,
    );

    let scope = credential_scope(&parsed.date, &parsed.region, &parsed.service);
    let string_to_sign = build_string_to_sign(
        &parsed.timestamp,
        &scope,
        &hash_canonical_request(&canonical_request),
    );
    let signing_key = derive_signing_key(
        &credentials.secret_access_key,
        &parsed.date,
        &parsed.region,
        &parsed.service,
    )?;
    let expected_signature = compute_signature(&signing_key, &string_to_sign)?;

    if parsed
        .signature
        .as_bytes()
        .ct_eq(expected_signature.as_bytes())
        .into()
    {
        debug!(access_key_id = %parsed.access_key_id, "presigned URL verification succeeded");
        Ok(parsed)
    } else {
        debug!("presigned URL signature mismatch");
        Err(AuthError::SignatureDoesNotMatch)
    }
}

/// Decode all query pairs except the signature itself.
fn decoded_query_without_signature(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|param| !param.is_empty() && !param.starts_with("X-Amz-Signature="))
        .map(|param| {
            let (k, v) = param.split_once('=').unwrap_or((param, ""));
            (url_decode(k), url_decode(v))
        })
        .collect()
}

/// Check whether the presigned URL has expired at `now`.
fn check_expiration(timestamp: &str, expires: u64, now: DateTime<Utc>) -> Result<(), AuthError> {
    let request_time = NaiveDateTime::parse_from_str(timestamp, AMZ_DATE_FORMAT)
        .map_err(|_| AuthError::MalformedQueryParam("X-Amz-Date (invalid format)".to_owned()))?
        .and_utc();

    let expiry_time = i64::try_from(expires)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .and_then(|lifetime| request_time.checked_add_signed(lifetime))
        .ok_or_else(|| AuthError::MalformedQueryParam("X-Amz-Expires (out of range)".to_owned()))?;

    if now > expiry_time {
        return Err(AuthError::RequestExpired);
    }

    Ok(())
}

/// Collect `(name, value)` pairs for the signed headers.
fn collect_signed_headers(
    headers: &http::HeaderMap,
    signed_headers: &[String],
) -> Result<Vec<(String, String)>, AuthError> {
    signed_headers
        .iter()
        .map(|name| {
            let value = headers
                .get(name.as_str())
                .ok_or_else(|| AuthError::MissingHeader(name.clone()))?
                .to_str()
                .map_err(|_| AuthError::MissingHeader(name.clone()))?;
            Ok((name.clone(), value.to_owned()))
        })
        .collect()
}

fn url_decode(input: &str) -> String {
    percent_decode_str(input).decode_utf8_lossy().into_owned()
}

fn get_required_param(params: &HashMap<String, String>, name: &str) -> Result<String, AuthError> {
    params
        .get(name)
        .cloned()
        .ok_or_else(|| AuthError::MissingQueryParam(name.to_owned()))
}
