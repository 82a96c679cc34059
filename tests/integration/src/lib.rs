//! Integration tests for RustDrop server.
//!
//! These tests require a running RustDrop server at `localhost:3000` whose
//! storage settings point at an S3-compatible store reachable at
//! `localhost:9000` that accepts the `auto` signing region (Cloudflare R2, or
//! MinIO started with `MINIO_SITE_REGION=auto`). They are marked `#[ignore]`
//! so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p rustdrop-integration -- --ignored
//! ```
//!
//! | Variable | Default |
//! |----------|---------|
//! | `RUSTDROP_URL` | `http://localhost:3000` |
//! | `S3_ENDPOINT_URL` | `http://localhost:9000` |
//! | `R2_BUCKET_NAME` | `rustdrop-test` |
//! | `R2_ACCESS_KEY_ID` | `test` |
//! | `R2_SECRET_ACCESS_KEY` | `test` |

use std::sync::Once;

use aws_credential_types::Credentials;
use aws_sdk_s3::config::{BehaviorVersion, Region};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_owned())
}

/// Base URL of the RustDrop server.
#[must_use]
pub fn server_url() -> String {
    env_or("RUSTDROP_URL", "http://localhost:3000")
}

/// Bucket the server issues URLs for.
#[must_use]
pub fn bucket_name() -> String {
    env_or("R2_BUCKET_NAME", "rustdrop-test")
}

/// Create an HTTP client for talking to the server and the store.
#[must_use]
pub fn http_client() -> reqwest::Client {
    init_tracing();
    reqwest::Client::new()
}

/// Create an S3 client pointing at the object store behind the server.
#[must_use]
pub fn s3_client() -> aws_sdk_s3::Client {
    init_tracing();

    let creds = Credentials::new(
        env_or("R2_ACCESS_KEY_ID", "test"),
        env_or("R2_SECRET_ACCESS_KEY", "test"),
        None,
        None,
        "integration-test",
    );

    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("auto"))
        .credentials_provider(creds)
        .endpoint_url(env_or("S3_ENDPOINT_URL", "http://localhost:9000"))
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(config)
}

/// Make sure the server's bucket exists.
pub async fn ensure_bucket(client: &aws_sdk_s3::Client) {
    let bucket = bucket_name();
    if client.head_bucket().bucket(&bucket).send().await.is_ok() {
        return;
    }
    client
        .create_bucket()
        .bucket(&bucket)
        .send()
        .await
        .unwrap_or_else(|e| panic!("failed to create bucket {bucket}: {e}"));
}

/// A unique caller id so concurrent test runs never share a namespace.
#[must_use]
pub fn test_user_id(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Request a presigned upload as `user`.
pub async fn presign(
    client: &reqwest::Client,
    user: Option<&str>,
    body: &serde_json::Value,
) -> (reqwest::StatusCode, serde_json::Value) {
    let mut req = client
        .post(format!("{}/api/presign", server_url()))
        .json(body);
    if let Some(user) = user {
        req = req.header("x-user-id", user);
    }
    let resp = req.send().await.expect("presign request");
    let status = resp.status();
    let json = resp.json().await.expect("presign response body");
    (status, json)
}

mod test_health;
mod test_presign;
mod test_upload;
