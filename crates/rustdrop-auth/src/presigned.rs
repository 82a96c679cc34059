//! Presigned PUT URL construction for AWS Signature Version 4.
//!
//! Presigned URLs carry authentication information in query parameters rather
//! than HTTP headers:
//!
//! - `X-Amz-Algorithm` - Always `AWS4-HMAC-SHA256`
//! - `X-Amz-Credential` - `AKID/date/region/service/aws4_request`
//! - `X-Amz-Date` - ISO 8601 basic format timestamp (`YYYYMMDDTHHMMSSZ`)
//! - `X-Amz-Expires` - Validity duration in seconds
//! - `X-Amz-SignedHeaders` - Semicolon-separated signed header names
//! - `X-Amz-Signature` - The hex-encoded signature
//!
//! The body is streamed by the client straight to the object store, so the
//! payload hash is always `UNSIGNED-PAYLOAD`. Region is `auto` and service is
//! `s3`, the convention used by Cloudflare R2 and accepted by MinIO.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::canonical::{
    build_canonical_headers, build_canonical_query_string, build_canonical_request,
    build_canonical_uri, build_signed_headers_string, normalize_header_value,
};
use crate::error::AuthError;
use crate::sigv4::{
    ALGORITHM, build_string_to_sign, compute_signature, credential_scope, derive_signing_key,
    format_amz_date, hash_canonical_request,
};

/// The payload hash value used for all presigned URL requests.
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Region token of the credential scope.
pub const SIGNING_REGION: &str = "auto";

/// Service token of the credential scope.
pub const SIGNING_SERVICE: &str = "s3";

/// Upper bound of `X-Amz-Expires` allowed by SigV4 (7 days).
pub const MAX_EXPIRES_SECS: u64 = 60 * 60 * 24 * 7;

/// Headers covered by the signature, in canonical order.
pub const SIGNED_HEADERS: [&str; 2] = ["content-type", "host"];

/// HTTP method of every URL produced here.
const METHOD: &str = "PUT";

/// Access key pair used to sign requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// The access key ID, embedded in `X-Amz-Credential`.
    pub access_key_id: String,
    /// The secret access key. Never logged or serialized.
    pub secret_access_key: String,
}

impl Credentials {
    /// Create a new credential pair.
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .finish()
    }
}

/// Everything needed to sign one PUT.
#[derive(Debug, Clone)]
pub struct SigningContext<'a> {
    /// Credentials of the bucket owner.
    pub credentials: &'a Credentials,
    /// Object store endpoint, e.g. `https://<account>.r2.cloudflarestorage.com`.
    pub endpoint: &'a str,
    /// Bucket name, addressed path-style.
    pub bucket: &'a str,
    /// Object key inside the bucket.
    pub key: &'a str,
    /// Content type the client must send.
    pub content_type: &'a str,
    /// Requested lifetime; clamped to `[1, MAX_EXPIRES_SECS]`.
    pub expires_in_secs: i64,
}

/// A signed PUT URL plus the headers the client must echo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedUpload {
    /// Absolute URL including the signature.
    pub upload_url: String,
    /// Effective lifetime of the URL in seconds.
    pub expires_in: u64,
    /// Headers that are part of the signature (only `Content-Type`).
    pub headers: BTreeMap<String, String>,
}

/// Scheme, host and path of a parsed endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// `http` or `https`.
    pub scheme: String,
    /// Host with a non-default port, without user-info.
    pub host: String,
    /// Path component of the endpoint (may be empty or `/`).
    pub path: String,
}

impl Endpoint {
    /// Parse an absolute `http`/`https` endpoint URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use rustdrop_auth::presigned::Endpoint;
    ///
    /// let ep = Endpoint::parse("https://acct.r2.cloudflarestorage.com:443/").unwrap();
    /// assert_eq!(ep.host, "acct.r2.cloudflarestorage.com");
    /// let ep = Endpoint::parse("http://localhost:9000").unwrap();
    /// assert_eq!(ep.host, "localhost:9000");
    /// ```
    pub fn parse(endpoint: &str) -> Result<Self, AuthError> {
        let uri: http::Uri = endpoint
            .trim()
            .parse()
            .map_err(|e: http::uri::InvalidUri| AuthError::InvalidEndpoint(e.to_string()))?;

        let scheme = uri
            .scheme_str()
            .ok_or_else(|| AuthError::InvalidEndpoint("missing scheme".to_owned()))?
            .to_ascii_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(AuthError::InvalidEndpoint(format!(
                "unsupported scheme: {scheme}"
            )));
        }

        let authority = uri
            .authority()
            .ok_or_else(|| AuthError::InvalidEndpoint("missing host".to_owned()))?;
        let hostname = authority.host().to_ascii_lowercase();
        if hostname.is_empty() {
            return Err(AuthError::InvalidEndpoint("missing host".to_owned()));
        }

        let default_port = if scheme == "https" { 443 } else { 80 };
        let host = match authority.port_u16() {
            Some(port) if port != default_port => format!("{hostname}:{port}"),
            _ => hostname,
        };

        Ok(Self {
            scheme,
            host,
            path: uri.path().to_owned(),
        })
    }

    /// `scheme://host`.
    #[must_use]
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }
}

/// Clamp a requested lifetime into the range SigV4 accepts.
///
/// # Examples
///
/// ```
/// use rustdrop_auth::presigned::clamp_expires;
///
/// assert_eq!(clamp_expires(0), 1);
/// assert_eq!(clamp_expires(120), 120);
/// assert_eq!(clamp_expires(i64::MAX), 604_800);
/// ```
#[must_use]
pub fn clamp_expires(requested: i64) -> u64 {
    u64::try_from(requested.max(1))
        .unwrap_or(1)
        .min(MAX_EXPIRES_SECS)
}

/// Build a SigV4 presigned PUT URL for the object described by `ctx`.
///
/// The result is fully determined by `ctx` and `now` truncated to the second.
///
/// # Errors
///
/// Returns [`AuthError::InvalidEndpoint`] if the endpoint cannot be parsed and
/// [`AuthError::InvalidSigningKey`] if the HMAC primitive rejects a key.
pub fn presign_put(ctx: &SigningContext<'_>, now: DateTime<Utc>) -> Result<PresignedUpload, AuthError> {
    let endpoint = Endpoint::parse(ctx.endpoint)?;

    let amz_date = format_amz_date(&now);
    let date_stamp = &amz_date[..8];
    let expires_in = clamp_expires(ctx.expires_in_secs);
    let scope = credential_scope(date_stamp, SIGNING_REGION, SIGNING_SERVICE);

    let canonical_uri = build_canonical_uri(&endpoint.path, ctx.bucket, ctx.key);

    let credential = format!("{}/{scope}", ctx.credentials.access_key_id);
    let expires = expires_in.to_string();
    let signed_headers = build_signed_headers_string(&SIGNED_HEADERS);
    let canonical_query = build_canonical_query_string(&[
        ("X-Amz-Algorithm", ALGORITHM),
        ("X-Amz-Credential", &credential),
        ("X-Amz-Date", &amz_date),
        ("X-Amz-Expires", &expires),
        ("X-Amz-SignedHeaders", &signed_headers),
    ]);

    let content_type = normalize_header_value(ctx.content_type);
    let canonical_headers =
        build_canonical_headers(&[("content-type", &content_type), ("host", &endpoint.host)]);

    let canonical_request = build_canonical_request(
        METHOD,
        &canonical_uri,
        &canonical_query,
        &canonical_headers,
        &signed_headers,
        UNSIGNED_PAYLOAD,
    );
    let canonical_hash = hash_canonical_request(&canonical_request);
    let string_to_sign = build_string_to_sign(&amz_date, &scope, &canonical_hash);

    let signing_key = derive_signing_key(
        &ctx.credentials.secret_access_key,
        date_stamp,
        SIGNING_REGION,
        SIGNING_SERVICE,
    )?;
    let signature = compute_signature(&signing_key, &string_to_sign)?;

    debug!(
        bucket = ctx.bucket,
        key = ctx.key,
        host = %endpoint.host,
        amz_date = %amz_date,
        expires_in,
        "built presigned PUT"
    );

    let upload_url = format!(
        "{}{canonical_uri}?{canonical_query}&X-Amz-Signature={signature}",
        endpoint.origin()
    );

    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".to_owned(), content_type);

    Ok(PresignedUpload {
        upload_url,
        expires_in,
        headers,
    })
}
