//! RustDrop Server - presigned upload URL issuance.
//!
//! Issues short-lived SigV4 presigned `PUT` URLs so clients upload files
//! straight to an S3-compatible object store (Cloudflare R2, AWS S3, MinIO).
//! Caller authentication is expected to happen in front of this server, which
//! forwards the caller id in a trusted header.
//!
//! # Usage
//!
//! ```text
//! R2_ENDPOINT=https://<account>.r2.cloudflarestorage.com R2_BUCKET_NAME=uploads \
//! R2_ACCESS_KEY_ID=... R2_SECRET_ACCESS_KEY=... rustdrop-server
//! ```
//!
//! # Flags
//!
//! Pass `--health-check` to check a running server's `/health`, or
//! `--self-check` to issue a presigned URL from the current environment and
//! verify its signature locally, without contacting the object store.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:3000` | Bind address |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `LOG_FORMAT` | `text` | `json` for JSON log lines |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |
//! | `IDENTITY_HEADER` | `x-user-id` | Header carrying the authenticated caller id |
//! | `R2_ACCESS_KEY_ID` | *(unset)* | Object store access key id |
//! | `R2_SECRET_ACCESS_KEY` | *(unset)* | Object store secret |
//! | `R2_ENDPOINT` | *(unset)* | Object store endpoint URL |
//! | `R2_BUCKET_NAME` | *(unset)* | Destination bucket |
//! | `R2_PUBLIC_URL` | *(unset)* | Public base URL for uploaded objects |
//! | `PRESIGN_ALLOWED_MIME_TYPES` | common image types | Comma-separated allow list |
//! | `PRESIGN_FILE_MAX_SIZE_BYTES` | `10485760` | Maximum upload size |
//! | `PRESIGN_FILE_EXPIRES_IN_SECONDS` | `120` | URL lifetime |

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rustdrop_auth::verify_presigned;
use rustdrop_core::policy::require_storage;
use rustdrop_core::{PresignRequest, RustDropConfig, RustDropPresigner};
use rustdrop_http::identity::IdentityResolver;
use rustdrop_http::{HeaderIdentityResolver, RustDropHttpConfig, RustDropHttpService};

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}

/// Build the identity resolver from the configured header name.
fn build_identity_resolver(config: &RustDropConfig) -> Result<HeaderIdentityResolver> {
    HeaderIdentityResolver::new(&config.identity_header)
        .with_context(|| format!("invalid IDENTITY_HEADER: {}", config.identity_header))
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve<I: IdentityResolver>(
    listener: TcpListener,
    service: RustDropHttpService<I>,
) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Request `/health` from a running server.
///
/// Used by the `--health-check` flag (container `HEALTHCHECK`).
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"status\":\"ok\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

/// Caller id used for the self-check upload.
const SELF_CHECK_IDENTITY: &str = "rustdrop-self-check";

/// Issue a presigned upload from `config` and verify it with the configured
/// credentials, as the object store would on receipt of the `PUT`.
///
/// Returns the object key of the issued URL.
fn run_self_check(config: RustDropConfig, now: DateTime<Utc>) -> Result<String> {
    let storage = require_storage(&config.storage)?;
    let content_type = config
        .presign
        .allowed_mime_types
        .first()
        .cloned()
        .context("PRESIGN_ALLOWED_MIME_TYPES is empty")?;

    let request = PresignRequest {
        file_name: "self-check".to_owned(),
        content_type,
        size: 1,
        key: None,
    };
    let response = RustDropPresigner::new(config)
        .presign_at(SELF_CHECK_IDENTITY, &request, now)
        .context("failed to issue presigned URL")?;

    let uri: http::Uri = response
        .upload_url
        .parse()
        .context("issued upload URL does not parse")?;
    let mut headers = http::HeaderMap::new();
    let host = uri.authority().context("issued upload URL has no host")?;
    headers.insert(http::header::HOST, http::HeaderValue::from_str(host.as_str())?);
    for (name, value) in &response.headers {
        headers.insert(
            http::HeaderName::from_bytes(name.as_bytes())?,
            http::HeaderValue::from_str(value)?,
        );
    }

    verify_presigned(&http::Method::PUT, &uri, &headers, &storage.credentials, now)
        .context("issued upload URL failed signature verification")?;

    Ok(response.key)
}

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::args().any(|a| a == "--self-check") {
        let config = RustDropConfig::from_env();
        init_tracing(&config.log_level, config.log_json)?;
        let key = run_self_check(config, Utc::now())?;
        info!(key = %key, "self-check passed");
        return Ok(());
    }

    if std::env::args().any(|a| a == "--health-check") {
        let config = RustDropConfig::from_env();
        let addr = config.gateway_listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    let config = RustDropConfig::from_env();

    init_tracing(&config.log_level, config.log_json)?;

    info!(
        gateway_listen = %config.gateway_listen,
        identity_header = %config.identity_header,
        bucket = config.storage.bucket_name.as_deref().unwrap_or("-"),
        allowed_mime_types = ?config.presign.allowed_mime_types,
        file_max_size_bytes = config.presign.file_max_size_bytes,
        file_presign_expires_in_seconds = config.presign.file_presign_expires_in_seconds,
        version = VERSION,
        "starting RustDrop Server",
    );

    if let Err(e) = require_storage(&config.storage) {
        warn!(error = %e, "storage is not fully configured; presign requests will fail");
    }

    let identity = build_identity_resolver(&config)?;
    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let presigner = RustDropPresigner::new(config);
    let service = RustDropHttpService::new(
        Arc::new(presigner),
        Arc::new(identity),
        RustDropHttpConfig::default(),
    );

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(listener, service).await
}
