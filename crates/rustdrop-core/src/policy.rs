//! Upload policy enforcement.
//!
//! All checks here run before any key resolution or signing work.

use rustdrop_auth::Credentials;

use crate::config::{PresignPolicyConfig, StorageConfig};
use crate::error::{PresignError, PresignResult};

/// Validate a declared content type and size against the policy.
///
/// The content type is trimmed and lower-cased before the allow list lookup;
/// `allowed_mime_types` is expected to be normalized the same way.
///
/// # Errors
///
/// - [`PresignError::UnsupportedMediaType`] if the content type is not allowed.
/// - [`PresignError::PayloadTooLarge`] if `size > max_size_bytes`.
///
/// # Examples
///
/// ```
/// use rustdrop_core::policy::validate;
///
/// let allowed = vec!["image/png".to_owned()];
/// assert!(validate(" Image/PNG ", 10, &allowed, 10).is_ok());
/// assert!(validate("application/pdf", 10, &allowed, 10).is_err());
/// assert!(validate("image/png", 11, &allowed, 10).is_err());
/// ```
pub fn validate(
    content_type: &str,
    size: u64,
    allowed_mime_types: &[String],
    max_size_bytes: u64,
) -> PresignResult<()> {
    let content_type = normalize_content_type(content_type);
    if !allowed_mime_types.iter().any(|m| *m == content_type) {
        return Err(PresignError::UnsupportedMediaType {
            content_type,
            allowed_mime_types: allowed_mime_types.to_vec(),
        });
    }
    if size > max_size_bytes {
        return Err(PresignError::PayloadTooLarge {
            size,
            max_size_bytes,
        });
    }
    Ok(())
}

/// Trimmed, lower-cased content type.
#[must_use]
pub fn normalize_content_type(content_type: &str) -> String {
    content_type.trim().to_ascii_lowercase()
}

/// The content type and size policy applied to every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    allowed_mime_types: Vec<String>,
    max_size_bytes: u64,
}

impl UploadPolicy {
    /// Build a policy, normalizing and de-duplicating the allow list.
    #[must_use]
    pub fn new(allowed_mime_types: impl IntoIterator<Item = String>, max_size_bytes: u64) -> Self {
        let mut normalized: Vec<String> = Vec::new();
        for mime in allowed_mime_types {
            let mime = normalize_content_type(&mime);
            if !mime.is_empty() && !normalized.contains(&mime) {
                normalized.push(mime);
            }
        }
        Self {
            allowed_mime_types: normalized,
            max_size_bytes,
        }
    }

    /// Build the policy from configuration.
    #[must_use]
    pub fn from_config(config: &PresignPolicyConfig) -> Self {
        Self::new(
            config.allowed_mime_types.iter().cloned(),
            config.file_max_size_bytes,
        )
    }

    /// The allowed content types, in configured order.
    #[must_use]
    pub fn allowed_mime_types(&self) -> &[String] {
        &self.allowed_mime_types
    }

    /// The maximum declared upload size.
    #[must_use]
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Validate a request, returning the normalized content type on success.
    ///
    /// # Errors
    ///
    /// See [`validate`].
    pub fn check(&self, content_type: &str, size: u64) -> PresignResult<String> {
        validate(
            content_type,
            size,
            &self.allowed_mime_types,
            self.max_size_bytes,
        )?;
        Ok(normalize_content_type(content_type))
    }
}

/// Storage settings resolved from configuration, all required values present.
#[derive(Debug, Clone)]
pub struct StorageTarget {
    /// Signing credentials.
    pub credentials: Credentials,
    /// Object store endpoint URL.
    pub endpoint: String,
    /// Destination bucket.
    pub bucket_name: String,
}

/// Extract the storage settings needed for signing.
///
/// Blank values count as missing.
///
/// # Errors
///
/// Returns [`PresignError::Configuration`] naming every missing setting.
pub fn require_storage(storage: &StorageConfig) -> PresignResult<StorageTarget> {
    fn present(value: Option<&String>) -> Option<&str> {
        value.map(|v| v.trim()).filter(|v| !v.is_empty())
    }

    let access_key_id = present(storage.access_key_id.as_ref());
    let secret_access_key = present(storage.secret_access_key.as_ref());
    let endpoint = present(storage.endpoint.as_ref());
    let bucket_name = present(storage.bucket_name.as_ref());

    match (access_key_id, secret_access_key, endpoint, bucket_name) {
        (Some(access_key_id), Some(secret_access_key), Some(endpoint), Some(bucket_name)) => {
            Ok(StorageTarget {
                credentials: Credentials::new(access_key_id, secret_access_key),
                endpoint: endpoint.to_owned(),
                bucket_name: bucket_name.to_owned(),
            })
        }
        _ => {
            let missing: Vec<&str> = [
                ("R2_ACCESS_KEY_ID", access_key_id),
                ("R2_SECRET_ACCESS_KEY", secret_access_key),
                ("R2_ENDPOINT", endpoint),
                ("R2_BUCKET_NAME", bucket_name),
            ]
            .into_iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name)
            .collect();
            Err(PresignError::Configuration(format!(
                "Missing storage configuration: {}",
                missing.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        vec!["image/png".to_owned(), "image/jpeg".to_owned()]
    }

    #[test]
    fn test_should_accept_allowed_type_within_limit() {
        assert!(validate("image/png", 1024, &allowed(), 1024).is_ok());
    }

    #[test]
    fn test_should_reject_unlisted_type_with_allow_list() {
        let err = validate("application/pdf", 1, &["image/png".to_owned()], 10).unwrap_err();
        match err {
            PresignError::UnsupportedMediaType {
                content_type,
                allowed_mime_types,
            } => {
                assert_eq!(content_type, "application/pdf");
                assert_eq!(allowed_mime_types, vec!["image/png"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_should_reject_size_one_over_limit() {
        let err = validate("image/png", 1025, &allowed(), 1024).unwrap_err();
        assert!(matches!(
            err,
            PresignError::PayloadTooLarge {
                size: 1025,
                max_size_bytes: 1024
            }
        ));
    }

    #[test]
    fn test_should_check_type_before_size() {
        let err = validate("text/plain", u64::MAX, &allowed(), 1).unwrap_err();
        assert!(matches!(err, PresignError::UnsupportedMediaType { .. }));
    }

    #[test]
    fn test_should_normalize_policy_allow_list() {
        let policy = UploadPolicy::new(
            vec![
                " Image/PNG ".to_owned(),
                "image/png".to_owned(),
                String::new(),
                "image/gif".to_owned(),
            ],
            5,
        );
        assert_eq!(policy.allowed_mime_types(), ["image/png", "image/gif"]);
        assert_eq!(policy.check("IMAGE/GIF", 5).unwrap(), "image/gif");
    }

    #[test]
    fn test_should_require_all_storage_settings() {
        let storage = StorageConfig::builder()
            .access_key_id("AKID")
            .secret_access_key("top-secret")
            .bucket_name("  ")
            .build();
        let err = require_storage(&storage).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("R2_ENDPOINT"));
        assert!(message.contains("R2_BUCKET_NAME"));
        assert!(!message.contains("R2_ACCESS_KEY_ID"));
        assert!(!message.contains("top-secret"));
        assert_eq!(err.status_code(), http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_should_build_storage_target() {
        let storage = StorageConfig::builder()
            .access_key_id("AKID")
            .secret_access_key("secret")
            .endpoint("https://acct.r2.cloudflarestorage.com")
            .bucket_name("uploads")
            .build();
        let target = require_storage(&storage).unwrap();
        assert_eq!(target.credentials.access_key_id, "AKID");
        assert_eq!(target.bucket_name, "uploads");
    }
}
