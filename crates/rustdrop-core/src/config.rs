//! Configuration for RustDrop.
//!
//! Configuration is an immutable value built once at startup, either from the
//! environment via [`RustDropConfig::from_env`] or programmatically via the
//! typed builders. Storage credentials may be absent at startup; the presign
//! pipeline reports them as a configuration error per request.

use std::fmt;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Default allow list of upload content types.
pub const DEFAULT_ALLOWED_MIME_TYPES: &str = "image/jpeg,image/png,image/webp,image/avif,image/gif";

/// Default maximum upload size (10 MiB).
pub const DEFAULT_FILE_MAX_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Default lifetime of an issued URL in seconds.
pub const DEFAULT_FILE_PRESIGN_EXPIRES_IN_SECONDS: i64 = 120;

/// Object store connection settings.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    /// Access key ID (`R2_ACCESS_KEY_ID`).
    #[builder(default, setter(strip_option, into))]
    pub access_key_id: Option<String>,

    /// Secret access key (`R2_SECRET_ACCESS_KEY`). Never serialized.
    #[builder(default, setter(strip_option, into))]
    #[serde(skip_serializing, default)]
    pub secret_access_key: Option<String>,

    /// Endpoint URL (`R2_ENDPOINT`).
    #[builder(default, setter(strip_option, into))]
    pub endpoint: Option<String>,

    /// Bucket name (`R2_BUCKET_NAME`).
    #[builder(default, setter(strip_option, into))]
    pub bucket_name: Option<String>,

    /// Public base URL objects are served from (`R2_PUBLIC_URL`).
    #[builder(default, setter(strip_option, into))]
    pub public_url: Option<String>,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "***"),
            )
            .field("endpoint", &self.endpoint)
            .field("bucket_name", &self.bucket_name)
            .field("public_url", &self.public_url)
            .finish()
    }
}

/// Upload policy settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct PresignPolicyConfig {
    /// Accepted content types, lower-cased (`PRESIGN_ALLOWED_MIME_TYPES`).
    #[builder(default = parse_mime_list(DEFAULT_ALLOWED_MIME_TYPES))]
    pub allowed_mime_types: Vec<String>,

    /// Maximum declared upload size in bytes (`PRESIGN_FILE_MAX_SIZE_BYTES`).
    #[builder(default = DEFAULT_FILE_MAX_SIZE_BYTES)]
    pub file_max_size_bytes: u64,

    /// Requested URL lifetime in seconds (`PRESIGN_FILE_EXPIRES_IN_SECONDS`).
    #[builder(default = DEFAULT_FILE_PRESIGN_EXPIRES_IN_SECONDS)]
    pub file_presign_expires_in_seconds: i64,
}

impl Default for PresignPolicyConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Top-level configuration for the RustDrop service.
///
/// # Examples
///
/// ```
/// use rustdrop_core::config::RustDropConfig;
///
/// let config = RustDropConfig::default();
/// assert_eq!(config.gateway_listen, "0.0.0.0:3000");
/// assert_eq!(config.presign.file_presign_expires_in_seconds, 120);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct RustDropConfig {
    /// Bind address (`GATEWAY_LISTEN`).
    #[builder(default = String::from("0.0.0.0:3000"))]
    pub gateway_listen: String,

    /// Log level filter string (`LOG_LEVEL`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Emit JSON log lines (`LOG_FORMAT=json`).
    #[builder(default = false)]
    pub log_json: bool,

    /// Header carrying the authenticated caller id (`IDENTITY_HEADER`).
    #[builder(default = String::from("x-user-id"))]
    pub identity_header: String,

    /// Object store settings.
    #[builder(default)]
    pub storage: StorageConfig,

    /// Upload policy settings.
    #[builder(default)]
    pub presign: PresignPolicyConfig,
}

impl Default for RustDropConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RustDropConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// Unparseable numbers keep their defaults; blank values count as unset.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(v) = get("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = get("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = get("LOG_FORMAT") {
            config.log_json = v.trim().eq_ignore_ascii_case("json");
        }
        if let Some(v) = get("IDENTITY_HEADER") {
            config.identity_header = v.trim().to_ascii_lowercase();
        }

        config.storage = StorageConfig {
            access_key_id: get("R2_ACCESS_KEY_ID"),
            secret_access_key: get("R2_SECRET_ACCESS_KEY"),
            endpoint: get("R2_ENDPOINT"),
            bucket_name: get("R2_BUCKET_NAME"),
            public_url: get("R2_PUBLIC_URL"),
        };

        if let Some(v) = get("PRESIGN_ALLOWED_MIME_TYPES") {
            config.presign.allowed_mime_types = parse_mime_list(&v);
        }
        if let Some(n) = get("PRESIGN_FILE_MAX_SIZE_BYTES").and_then(|v| v.trim().parse().ok()) {
            config.presign.file_max_size_bytes = n;
        }
        if let Some(n) =
            get("PRESIGN_FILE_EXPIRES_IN_SECONDS").and_then(|v| v.trim().parse().ok())
        {
            config.presign.file_presign_expires_in_seconds = n;
        }

        config
    }
}

/// Parse a comma-separated content type list: trimmed, lower-cased, blanks dropped.
///
/// # Examples
///
/// ```
/// use rustdrop_core::config::parse_mime_list;
///
/// assert_eq!(parse_mime_list(" Image/PNG, ,image/gif"), vec!["image/png", "image/gif"]);
/// ```
#[must_use]
pub fn parse_mime_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().to_ascii_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}
