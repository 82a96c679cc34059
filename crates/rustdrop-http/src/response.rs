//! JSON response construction and error formatting.
//!
//! Error bodies have the shape:
//!
//! ```json
//! {
//!   "statusCode": 415,
//!   "statusMessage": "Unsupported Media Type",
//!   "message": "Unsupported media type: application/pdf",
//!   "data": { "allowedMimeTypes": ["image/png"] }
//! }
//! ```

use rustdrop_core::PresignError;
use serde_json::{Value, json};

use crate::body::RustDropResponseBody;
use crate::router::RouteError;

/// Content type for JSON responses.
pub const CONTENT_TYPE: &str = "application/json";

/// Build a JSON response with `status`.
#[must_use]
pub fn json_response(status: http::StatusCode, value: &Value) -> http::Response<RustDropResponseBody> {
    // Serializing a `Value` cannot fail.
    let json = serde_json::to_vec(value).unwrap_or_default();
    let mut response = http::Response::new(RustDropResponseBody::from_json(json));
    *response.status_mut() = status;
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static(CONTENT_TYPE),
    );
    response
}

/// Build a response with no body.
#[must_use]
pub fn empty_response(status: http::StatusCode) -> http::Response<RustDropResponseBody> {
    let mut response = http::Response::new(RustDropResponseBody::empty());
    *response.status_mut() = status;
    response
}

/// Render the error body for `status`, `message` and optional `data`.
#[must_use]
pub fn error_body(status: http::StatusCode, message: &str, data: Option<Value>) -> Value {
    let mut body = json!({
        "statusCode": status.as_u16(),
        "statusMessage": status.canonical_reason().unwrap_or("Error"),
        "message": message,
    });
    if let (Some(data), Some(map)) = (data, body.as_object_mut()) {
        map.insert("data".to_owned(), data);
    }
    body
}

/// Convert a [`PresignError`] into an HTTP error response.
#[must_use]
pub fn error_to_response(error: &PresignError) -> http::Response<RustDropResponseBody> {
    let status = error.status_code();
    json_response(status, &error_body(status, &error.to_string(), error.data()))
}

/// Convert a [`RouteError`] into an HTTP error response.
#[must_use]
pub fn route_error_to_response(error: &RouteError) -> http::Response<RustDropResponseBody> {
    let status = error.status_code();
    let mut response = json_response(status, &error_body(status, &error.to_string(), None));
    if let RouteError::MethodNotAllowed { allow, .. } = error {
        response
            .headers_mut()
            .insert(http::header::ALLOW, http::HeaderValue::from_static(allow));
    }
    response
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn body_json(response: http::Response<RustDropResponseBody>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_should_format_error_with_data() {
        let err = PresignError::PayloadTooLarge {
            size: 11,
            max_size_bytes: 10,
        };
        let response = error_to_response(&err);
        assert_eq!(response.status(), http::StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            CONTENT_TYPE
        );
        let body = body_json(response).await;
        assert_eq!(body["statusCode"], 413);
        assert_eq!(body["statusMessage"], "Payload Too Large");
        assert_eq!(body["data"]["maxSizeBytes"], 10);
    }

    #[tokio::test]
    async fn test_should_omit_data_when_absent() {
        let response = error_to_response(&PresignError::Unauthenticated);
        assert_eq!(response.status(), http::StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Unauthenticated");
        assert!(body.get("data").is_none());
    }

    #[test]
    fn test_should_set_allow_header_on_method_not_allowed() {
        let err = RouteError::MethodNotAllowed {
            method: "GET".to_owned(),
            path: "/api/presign".to_owned(),
            allow: "POST, OPTIONS",
        };
        let response = route_error_to_response(&err);
        assert_eq!(response.status(), http::StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get("allow").unwrap(), "POST, OPTIONS");
    }

    #[test]
    fn test_should_build_empty_response() {
        let response = empty_response(http::StatusCode::NO_CONTENT);
        assert_eq!(response.status(), http::StatusCode::NO_CONTENT);
        assert!(response.headers().get("content-type").is_none());
    }
}
