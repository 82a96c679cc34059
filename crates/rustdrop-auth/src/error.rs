//! Error types for SigV4 presigning and verification.
//!
//! Signing failures ([`AuthError::InvalidEndpoint`], [`AuthError::InvalidSigningKey`])
//! indicate a deployment problem and are never retryable. The remaining variants
//! are produced while verifying a presigned URL.

/// Errors that can occur while building or verifying a SigV4 presigned URL.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The configured endpoint is not an absolute `http`/`https` URL.
    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    /// The HMAC primitive rejected a key during signing key derivation.
    #[error("Invalid signing key: {0}")]
    InvalidSigningKey(String),

    /// The signing algorithm is not supported (only AWS4-HMAC-SHA256 is supported).
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// A required query parameter for presigned URL authentication is missing.
    #[error("Missing required query parameter: {0}")]
    MissingQueryParam(String),

    /// A query parameter is present but its value is out of range or malformed.
    #[error("Malformed query parameter: {0}")]
    MalformedQueryParam(String),

    /// A header listed in `X-Amz-SignedHeaders` is missing from the request.
    #[error("Missing required header: {0}")]
    MissingHeader(String),

    /// The `X-Amz-Credential` value does not match
    /// `AKID/date/region/service/aws4_request`.
    #[error("Invalid credential format")]
    InvalidCredential,

    /// The access key in the credential scope is not the expected one.
    #[error("Access key not recognized: {0}")]
    AccessKeyMismatch(String),

    /// The presigned URL has expired (`now` exceeds `X-Amz-Date` + `X-Amz-Expires`).
    #[error("Request has expired")]
    RequestExpired,

    /// The computed signature does not match the provided signature.
    #[error("Signature does not match")]
    SignatureDoesNotMatch,
}
