//! AWS Signature Version 4 signing primitives.
//!
//! The signing key is derived by an ordered chain of HMAC-SHA256 steps, each
//! step keyed with the raw output of the previous one:
//!
//! ```text
//! kSecret  = "AWS4" + secret_key
//! kDate    = HMAC-SHA256(kSecret,  date)
//! kRegion  = HMAC-SHA256(kDate,    region)
//! kService = HMAC-SHA256(kRegion,  service)
//! kSigning = HMAC-SHA256(kService, "aws4_request")
//! ```
//!
//! The chain is expressed as data ([`signing_key_steps`]) folded over a byte
//! buffer, so each step can be inspected on its own.

use chrono::{DateTime, Utc};
use hmac::{Hmac, KeyInit, Mac};
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// The only algorithm supported by this implementation.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Terminator of every SigV4 credential scope.
pub const SCOPE_TERMINATOR: &str = "aws4_request";

/// Format string of the `X-Amz-Date` timestamp.
pub const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

type HmacSha256 = Hmac<Sha256>;

/// Format a timestamp as a SigV4 `amzDate` (`YYYYMMDDTHHMMSSZ`).
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use rustdrop_auth::sigv4::format_amz_date;
///
/// let now = Utc.with_ymd_and_hms(2013, 5, 24, 0, 0, 0).unwrap();
/// assert_eq!(format_amz_date(&now), "20130524T000000Z");
/// ```
#[must_use]
pub fn format_amz_date(now: &DateTime<Utc>) -> String {
    now.format(AMZ_DATE_FORMAT).to_string()
}

/// Build the credential scope `date/region/service/aws4_request`.
#[must_use]
pub fn credential_scope(date_stamp: &str, region: &str, service: &str) -> String {
    format!("{date_stamp}/{region}/{service}/{SCOPE_TERMINATOR}")
}

/// Build the SigV4 string to sign.
///
/// # Examples
///
/// ```
/// use rustdrop_auth::sigv4::build_string_to_sign;
///
/// let sts = build_string_to_sign(
///     "20130524T000000Z",
///     "20130524/us-east-1/s3/aws4_request",
///     "7344ae5b7ee6c3e7e6b0fe0640412a37625d1fbfff95c48bbb2dc43964946972",
/// );
/// assert!(sts.starts_with("AWS4-HMAC-SHA256\n20130524T000000Z\n"));
/// ```
#[must_use]
pub fn build_string_to_sign(
    timestamp: &str,
    credential_scope: &str,
    canonical_request_hash: &str,
) -> String {
    format!("{ALGORITHM}\n{timestamp}\n{credential_scope}\n{canonical_request_hash}")
}

/// The ordered messages fed through the HMAC chain when deriving a signing key.
#[must_use]
pub fn signing_key_steps<'a>(date: &'a str, region: &'a str, service: &'a str) -> [&'a [u8]; 4] {
    [
        date.as_bytes(),
        region.as_bytes(),
        service.as_bytes(),
        SCOPE_TERMINATOR.as_bytes(),
    ]
}

/// Derive the SigV4 signing key.
///
/// # Examples
///
/// ```
/// use rustdrop_auth::sigv4::derive_signing_key;
///
/// let key = derive_signing_key(
///     "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY",
///     "20130524",
///     "us-east-1",
///     "s3",
/// )
/// .unwrap();
/// assert_eq!(key.len(), 32);
/// ```
pub fn derive_signing_key(
    secret_key: &str,
    date: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, AuthError> {
    let seed = format!("AWS4{secret_key}").into_bytes();
    signing_key_steps(date, region, service)
        .into_iter()
        .try_fold(seed, |key, message| hmac_sha256(&key, message))
}

/// Compute the hex-encoded HMAC-SHA256 signature of `string_to_sign`.
pub fn compute_signature(signing_key: &[u8], string_to_sign: &str) -> Result<String, AuthError> {
    hmac_sha256(signing_key, string_to_sign.as_bytes()).map(hex::encode)
}

/// Hash a canonical request with SHA-256 and return lower-case hex.
#[must_use]
pub fn hash_canonical_request(canonical_request: &str) -> String {
    hex::encode(Sha256::digest(canonical_request.as_bytes()))
}

/// Compute HMAC-SHA256 and return the raw bytes.
fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, AuthError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AuthError::InvalidSigningKey(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
