//! Object key resolution.
//!
//! Turns an optional caller-supplied key hint into a safe object key that
//! always lives under the caller's [`IdentityNamespace`], never contains empty,
//! `.` or `..` segments, and always ends in a file extension.

use std::fmt;

use uuid::Uuid;

use crate::error::{PresignError, PresignResult};
use crate::namespace::IdentityNamespace;

/// Fallback extension when neither the file name nor the content type yields one.
pub const DEFAULT_EXTENSION: &str = "bin";

/// Known content type to extension mappings.
const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/avif", "avif"),
    ("image/gif", "gif"),
];

/// A resolved, namespaced object key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the key, returning the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolve the object key for an upload.
///
/// - No hint: `{namespace}/{uuid}.{extension}`.
/// - Hint ending in `/`: `{namespace}/{hint}{uuid}.{extension}`.
/// - Hint whose last segment has an extension: `{namespace}/{hint}` verbatim.
/// - Any other hint: `{namespace}/{hint}.{extension}`.
///
/// # Errors
///
/// Returns [`PresignError::InvalidKey`] if the hint normalizes to nothing or
/// contains a `.` or `..` segment.
///
/// # Examples
///
/// ```
/// use rustdrop_core::{IdentityNamespace, key::resolve_object_key};
///
/// let ns = IdentityNamespace::from_identity("user_42").unwrap();
/// let key = resolve_object_key(Some("avatars/me"), &ns, "png").unwrap();
/// assert_eq!(key.as_str(), "user_42/avatars/me.png");
/// assert!(resolve_object_key(Some("../etc/passwd"), &ns, "png").is_err());
/// ```
pub fn resolve_object_key(
    hint: Option<&str>,
    namespace: &IdentityNamespace,
    extension: &str,
) -> PresignResult<ObjectKey> {
    let random_file_name = || format!("{}.{extension}", Uuid::new_v4());

    let Some(hint) = hint else {
        return Ok(ObjectKey(format!("{namespace}/{}", random_file_name())));
    };

    let normalized = normalize_requested_key(hint);
    if normalized.is_empty() {
        return Err(PresignError::invalid_key("Key is invalid"));
    }
    if has_path_traversal_segment(&normalized) {
        return Err(PresignError::invalid_key(
            "Key cannot contain path traversal segment",
        ));
    }

    let trimmed = normalized.trim_end_matches('/');
    let relative = if hint.trim().ends_with('/') {
        format!("{trimmed}/{}", random_file_name())
    } else if has_file_extension(trimmed) {
        trimmed.to_owned()
    } else {
        format!("{trimmed}.{extension}")
    };

    Ok(ObjectKey(format!("{namespace}/{relative}")))
}

/// Pick the file extension for an upload.
///
/// Prefers the extension of `file_name` (lower-cased), then the known mapping
/// for `content_type`, then [`DEFAULT_EXTENSION`].
#[must_use]
pub fn resolve_file_extension(file_name: &str, content_type: &str) -> String {
    if let Some(ext) = trailing_extension(file_name) {
        return ext.to_ascii_lowercase();
    }
    let content_type = content_type.trim().to_ascii_lowercase();
    MIME_EXTENSIONS
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .map_or(DEFAULT_EXTENSION, |&(_, ext)| ext)
        .to_owned()
}

/// Whether the last `/` segment ends in `.` followed by ASCII alphanumerics.
#[must_use]
pub fn has_file_extension(key: &str) -> bool {
    let last = key.rsplit('/').next().unwrap_or_default();
    trailing_extension(last).is_some()
}

/// Trim, strip leading slashes, and collapse repeated slashes.
#[must_use]
pub fn normalize_requested_key(hint: &str) -> String {
    let stripped = hint.trim().trim_start_matches('/');
    let mut out = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Whether any `/`-delimited segment is `.` or `..`.
#[must_use]
pub fn has_path_traversal_segment(key: &str) -> bool {
    key.split('/').any(|segment| segment == "." || segment == "..")
}

fn trailing_extension(name: &str) -> Option<&str> {
    let (_, ext) = name.rsplit_once('.')?;
    (!ext.is_empty() && ext.bytes().all(|b| b.is_ascii_alphanumeric())).then_some(ext)
}
