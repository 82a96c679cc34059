//! Presign request and response payloads.
//!
//! [`PresignRequest::from_json`] validates a raw JSON body field by field and
//! reports every violation at once, keyed by the camelCase field name, so a
//! client can fix all problems in a single round trip.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PresignError, PresignResult};

/// Maximum file name length in characters.
const MAX_FILE_NAME_LEN: usize = 255;

/// Maximum content type length in characters.
const MAX_CONTENT_TYPE_LEN: usize = 100;

/// Maximum key hint length in characters.
const MAX_KEY_LEN: usize = 512;

/// A validated request for a presigned upload URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignRequest {
    /// Client-side file name, trimmed. Only used to pick an extension.
    pub file_name: String,
    /// Declared content type, trimmed (case preserved).
    pub content_type: String,
    /// Declared upload size in bytes, always greater than zero.
    pub size: u64,
    /// Optional object key hint, trimmed and restricted to `[A-Za-z0-9/_.-]`.
    pub key: Option<String>,
}

/// Collects per-field validation messages.
#[derive(Debug, Default)]
struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> PresignResult<T> {
        if self.0.is_empty() {
            Ok(value())
        } else {
            Err(PresignError::InvalidRequestBody { fields: self.0 })
        }
    }
}

impl PresignRequest {
    /// Parse and validate a JSON request body.
    ///
    /// # Errors
    ///
    /// Returns [`PresignError::InvalidRequestBody`] if the body is not a JSON
    /// object or any field violates its constraints.
    pub fn from_json(body: &[u8]) -> PresignResult<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| PresignError::invalid_field("body", format!("Malformed JSON: {e}")))?;
        Self::from_value(&value)
    }

    /// Validate an already-decoded JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`PresignError::InvalidRequestBody`] listing every violation.
    ///
    /// # Examples
    ///
    /// ```
    /// use rustdrop_core::PresignRequest;
    ///
    /// let body = serde_json::json!({
    ///     "fileName": " cat.png ",
    ///     "contentType": "image/png",
    ///     "size": "1024",
    ///     "key": "   ",
    /// });
    /// let request = PresignRequest::from_value(&body).unwrap();
    /// assert_eq!(request.file_name, "cat.png");
    /// assert_eq!(request.size, 1024);
    /// assert_eq!(request.key, None);
    /// ```
    pub fn from_value(value: &Value) -> PresignResult<Self> {
        let Some(object) = value.as_object() else {
            return Err(PresignError::invalid_field(
                "body",
                "Request body must be a JSON object",
            ));
        };

        let mut errors = FieldErrors::default();

        let file_name = bounded_string(
            object,
            "fileName",
            "File name",
            MAX_FILE_NAME_LEN,
            &mut errors,
        );
        let content_type = bounded_string(
            object,
            "contentType",
            "Content type",
            MAX_CONTENT_TYPE_LEN,
            &mut errors,
        );
        let size = positive_integer(object.get("size"), &mut errors);
        let key = key_hint(object.get("key"), &mut errors);

        errors.into_result(|| Self {
            file_name: file_name.unwrap_or_default(),
            content_type: content_type.unwrap_or_default(),
            size: size.unwrap_or_default(),
            key,
        })
    }
}

fn bounded_string(
    object: &Map<String, Value>,
    field: &str,
    label: &str,
    max_len: usize,
    errors: &mut FieldErrors,
) -> Option<String> {
    match object.get(field) {
        None | Some(Value::Null) => {
            errors.push(field, format!("{label} is required"));
            None
        }
        Some(Value::String(raw)) => {
            let trimmed = raw.trim();
            let len = trimmed.chars().count();
            if len == 0 {
                errors.push(field, format!("{label} is required"));
                None
            } else if len > max_len {
                errors.push(
                    field,
                    format!("{label} must be at most {max_len} characters"),
                );
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Some(_) => {
            errors.push(field, format!("{label} must be a string"));
            None
        }
    }
}

/// Accepts a JSON number or a numeric string, like a lenient form coercion.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]
fn positive_integer(value: Option<&Value>, errors: &mut FieldErrors) -> Option<u64> {
    const FIELD: &str = "size";

    let number = match value {
        None | Some(Value::Null) => {
            errors.push(FIELD, "File size is required");
            return None;
        }
        Some(Value::Number(n)) => n.clone(),
        Some(Value::String(s)) => match s.trim().parse::<serde_json::Number>() {
            Ok(n) => n,
            Err(_) => {
                errors.push(FIELD, "File size must be a number");
                return None;
            }
        },
        Some(_) => {
            errors.push(FIELD, "File size must be a number");
            return None;
        }
    };

    if let Some(n) = number.as_u64() {
        if n == 0 {
            errors.push(FIELD, "File size must be greater than 0");
            return None;
        }
        return Some(n);
    }
    if number.is_i64() {
        errors.push(FIELD, "File size must be greater than 0");
        return None;
    }

    let float = number.as_f64().unwrap_or(f64::NAN);
    if !float.is_finite() || float.fract() != 0.0 {
        errors.push(FIELD, "File size must be an integer");
        None
    } else if float <= 0.0 {
        errors.push(FIELD, "File size must be greater than 0");
        None
    } else if float >= u64::MAX as f64 {
        errors.push(FIELD, "File size is too large");
        None
    } else {
        Some(float as u64)
    }
}

/// A blank string or `null` means "no hint".
fn key_hint(value: Option<&Value>, errors: &mut FieldErrors) -> Option<String> {
    const FIELD: &str = "key";

    let raw = match value {
        None | Some(Value::Null) => return None,
        Some(Value::String(s)) => s.trim(),
        Some(_) => {
            errors.push(FIELD, "Key must be a string");
            return None;
        }
    };

    if raw.is_empty() {
        return None;
    }
    if raw.chars().count() > MAX_KEY_LEN {
        errors.push(FIELD, "Key is too long");
        return None;
    }
    if !raw
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'/' | b'_' | b'-' | b'.'))
    {
        errors.push(FIELD, "Key contains invalid characters");
        return None;
    }
    Some(raw.to_owned())
}

/// The caller-facing result of a successful presign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignResponse {
    /// The resolved, namespaced object key.
    pub key: String,
    /// The presigned PUT URL.
    pub upload_url: String,
    /// Where the object will be publicly readable, when a public base URL is configured.
    pub public_url: Option<String>,
    /// Always `PUT`.
    pub method: String,
    /// Headers the client must send with the upload.
    pub headers: BTreeMap<String, String>,
    /// Effective URL lifetime in seconds.
    pub expires_in: u64,
    /// Configured upload size ceiling.
    pub max_size_bytes: u64,
}
