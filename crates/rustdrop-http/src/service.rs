//! RustDrop HTTP service implementing the hyper `Service` trait.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use rustdrop_core::{PresignError, PresignRequest, PresignResult, RustDropPresigner};
use serde_json::json;
use tracing::{debug, error, warn};

use crate::body::RustDropResponseBody;
use crate::identity::IdentityResolver;
use crate::response::{empty_response, error_to_response, json_response, route_error_to_response};
use crate::router::{Route, resolve_route};

/// Default maximum request body size (64 KiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Configuration for the RustDrop HTTP service.
#[derive(Debug, Clone)]
pub struct RustDropHttpConfig {
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for RustDropHttpConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Hyper `Service` exposing the presign endpoint.
///
/// The service is generic over the request body so it can be driven by
/// `hyper::body::Incoming` in the server and by in-memory bodies in tests.
#[derive(Debug)]
pub struct RustDropHttpService<I: IdentityResolver> {
    presigner: Arc<RustDropPresigner>,
    identity: Arc<I>,
    config: Arc<RustDropHttpConfig>,
}

impl<I: IdentityResolver> RustDropHttpService<I> {
    /// Create a new `RustDropHttpService`.
    pub fn new(presigner: Arc<RustDropPresigner>, identity: Arc<I>, config: RustDropHttpConfig) -> Self {
        Self {
            presigner,
            identity,
            config: Arc::new(config),
        }
    }
}

impl<I: IdentityResolver> Clone for RustDropHttpService<I> {
    fn clone(&self) -> Self {
        Self {
            presigner: Arc::clone(&self.presigner),
            identity: Arc::clone(&self.identity),
            config: Arc::clone(&self.config),
        }
    }
}

impl<I, B> hyper::service::Service<http::Request<B>> for RustDropHttpService<I>
where
    I: IdentityResolver,
    B: http_body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Response = http::Response<RustDropResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let service = self.clone();
        let request_id = uuid::Uuid::new_v4().to_string();

        Box::pin(async move {
            let response = service.process_request(req, &request_id).await;
            Ok(add_common_headers(response, &request_id))
        })
    }
}

impl<I: IdentityResolver> RustDropHttpService<I> {
    async fn process_request<B>(
        &self,
        req: http::Request<B>,
        request_id: &str,
    ) -> http::Response<RustDropResponseBody>
    where
        B: http_body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (parts, body) = req.into_parts();
        debug!(
            method = %parts.method,
            path = parts.uri.path(),
            request_id,
            "handling request"
        );

        let route = match resolve_route(&parts.method, parts.uri.path()) {
            Ok(route) => route,
            Err(err) => {
                warn!(request_id, error = %err, "no route");
                return route_error_to_response(&err);
            }
        };

        match route {
            Route::Health => json_response(
                http::StatusCode::OK,
                &json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }),
            ),
            Route::Preflight => preflight_response(),
            Route::Presign => match self.presign(&parts, body).await {
                Ok(value) => json_response(http::StatusCode::OK, &value),
                Err(err) => {
                    if err.is_client_error() {
                        warn!(
                            request_id,
                            code = err.code(),
                            status = err.status_code().as_u16(),
                            error = %err,
                            "presign rejected"
                        );
                    } else {
                        error!(
                            request_id,
                            code = err.code(),
                            error = %err,
                            "presign failed"
                        );
                    }
                    error_to_response(&err)
                }
            },
        }
    }

    /// Identity first, then body parsing, then the presign pipeline.
    async fn presign<B>(
        &self,
        parts: &http::request::Parts,
        body: B,
    ) -> PresignResult<serde_json::Value>
    where
        B: http_body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let identity = self
            .identity
            .resolve(parts)
            .ok_or(PresignError::Unauthenticated)?;
        let bytes = read_body(body, self.config.max_body_bytes).await?;
        let request = PresignRequest::from_json(&bytes)?;
        let response = self.presigner.presign(&identity, &request)?;
        serde_json::to_value(&response).map_err(|e| {
            PresignError::Configuration(format!("Failed to serialize presign response: {e}"))
        })
    }
}

/// Collect the body, failing once it exceeds `limit` bytes.
async fn read_body<B>(body: B, limit: usize) -> PresignResult<Bytes>
where
    B: http_body::Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => Err(
            PresignError::invalid_field("body", format!("Request body exceeds {limit} bytes")),
        ),
        Err(err) => Err(PresignError::invalid_field(
            "body",
            format!("Failed to read request body: {err}"),
        )),
    }
}

fn preflight_response() -> http::Response<RustDropResponseBody> {
    let mut response = empty_response(http::StatusCode::NO_CONTENT);
    let headers = response.headers_mut();
    headers.insert(
        "access-control-allow-methods",
        http::HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        http::HeaderValue::from_static("*"),
    );
    headers.insert(
        "access-control-max-age",
        http::HeaderValue::from_static("86400"),
    );
    response
}

/// Add common response headers to every response.
fn add_common_headers(
    mut response: http::Response<RustDropResponseBody>,
    request_id: &str,
) -> http::Response<RustDropResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.entry("x-request-id").or_insert(hv);
    }

    headers.insert("server", http::HeaderValue::from_static("RustDrop"));
    headers.insert(
        "access-control-allow-origin",
        http::HeaderValue::from_static("*"),
    );

    response
}
