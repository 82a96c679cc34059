//! Presign error taxonomy.
//!
//! Every failure of the presign pipeline is a [`PresignError`]. Each variant
//! carries what a client needs to correct the request (the offending field,
//! the allowed media types, the size limit) and maps to exactly one HTTP
//! status code.
//!
//! # Usage
//!
//! ```
//! use rustdrop_core::PresignError;
//!
//! let err = PresignError::PayloadTooLarge { size: 11, max_size_bytes: 10 };
//! assert_eq!(err.status_code(), http::StatusCode::PAYLOAD_TOO_LARGE);
//! assert_eq!(err.data().unwrap()["maxSizeBytes"], 10);
//! ```

use std::collections::BTreeMap;

use rustdrop_auth::AuthError;

/// Errors produced while issuing a presigned upload.
#[derive(Debug, thiserror::Error)]
pub enum PresignError {
    /// The request body is malformed or violates a field constraint.
    #[error("Invalid request body: {}", summarize(.fields))]
    InvalidRequestBody {
        /// Messages keyed by the offending field name.
        fields: BTreeMap<String, Vec<String>>,
    },

    /// The requested key hint cannot be turned into a safe object key.
    #[error("Invalid key: {reason}")]
    InvalidKey {
        /// Why the key was rejected.
        reason: String,
    },

    /// The content type is not on the allow list.
    #[error("Unsupported media type: {content_type}")]
    UnsupportedMediaType {
        /// The normalized content type that was rejected.
        content_type: String,
        /// The configured allow list.
        allowed_mime_types: Vec<String>,
    },

    /// The declared size exceeds the configured maximum.
    #[error("Payload too large: {size} bytes exceeds the {max_size_bytes} byte limit")]
    PayloadTooLarge {
        /// The declared size.
        size: u64,
        /// The configured maximum.
        max_size_bytes: u64,
    },

    /// No caller identity was supplied.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// The deployment is misconfigured; not retryable by the caller.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl PresignError {
    /// Build an [`PresignError::InvalidRequestBody`] for a single field.
    #[must_use]
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.into(), vec![message.into()]);
        Self::InvalidRequestBody { fields }
    }

    /// Build an [`PresignError::InvalidKey`].
    #[must_use]
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            reason: reason.into(),
        }
    }

    /// HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> http::StatusCode {
        match self {
            Self::InvalidRequestBody { .. } | Self::InvalidKey { .. } => {
                http::StatusCode::BAD_REQUEST
            }
            Self::UnsupportedMediaType { .. } => http::StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::PayloadTooLarge { .. } => http::StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unauthenticated => http::StatusCode::UNAUTHORIZED,
            Self::Configuration(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequestBody { .. } => "InvalidRequestBody",
            Self::InvalidKey { .. } => "InvalidKey",
            Self::UnsupportedMediaType { .. } => "UnsupportedMediaType",
            Self::PayloadTooLarge { .. } => "PayloadTooLarge",
            Self::Unauthenticated => "Unauthenticated",
            Self::Configuration(_) => "ConfigurationError",
        }
    }

    /// Whether the error comes from the caller's input rather than the deployment.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Structured details describing the violated constraint, if any.
    #[must_use]
    pub fn data(&self) -> Option<serde_json::Value> {
        match self {
            Self::InvalidRequestBody { fields } => Some(serde_json::json!(fields)),
            Self::InvalidKey { reason } => Some(serde_json::json!({ "key": [reason] })),
            Self::UnsupportedMediaType {
                allowed_mime_types, ..
            } => Some(serde_json::json!({ "allowedMimeTypes": allowed_mime_types })),
            Self::PayloadTooLarge { max_size_bytes, .. } => {
                Some(serde_json::json!({ "maxSizeBytes": max_size_bytes }))
            }
            Self::Unauthenticated | Self::Configuration(_) => None,
        }
    }
}

impl From<AuthError> for PresignError {
    fn from(err: AuthError) -> Self {
        Self::Configuration(err.to_string())
    }
}

fn summarize(fields: &BTreeMap<String, Vec<String>>) -> String {
    fields
        .iter()
        .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience result type for presign operations.
pub type PresignResult<T> = Result<T, PresignError>;
