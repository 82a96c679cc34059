//! HTTP service layer for RustDrop.
//!
//! - **Router**: `POST /api/presign`, `GET /health`, CORS preflight
//! - **Identity**: the seam to the authentication collaborator
//! - **Service**: Hyper `Service` implementation driving the presign pipeline
//! - **Response helpers**: JSON success/error response formatting

pub mod body;
pub mod identity;
pub mod response;
pub mod router;
pub mod service;

pub use body::RustDropResponseBody;
pub use identity::{HeaderIdentityResolver, IdentityResolver};
pub use service::{RustDropHttpConfig, RustDropHttpService};
