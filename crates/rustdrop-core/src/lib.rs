//! Upload policy, object key resolution, and presign orchestration for RustDrop.
//!
//! The entry point is [`RustDropPresigner`], built once from an immutable
//! [`RustDropConfig`] and shared across requests. It performs no I/O.
//!
//! # Modules
//!
//! - [`config`] - Environment and builder based configuration
//! - [`error`] - The presign error taxonomy and HTTP status mapping
//! - [`key`] - Object key and file extension resolution
//! - [`namespace`] - Caller identity to key namespace mapping
//! - [`policy`] - Content type, size, and storage configuration checks
//! - [`presigner`] - The presign pipeline
//! - [`request`] - Request validation and the response payload

pub mod config;
pub mod error;
pub mod key;
pub mod namespace;
pub mod policy;
pub mod presigner;
pub mod request;

pub use config::RustDropConfig;
pub use error::{PresignError, PresignResult};
pub use key::ObjectKey;
pub use namespace::IdentityNamespace;
pub use policy::UploadPolicy;
pub use presigner::RustDropPresigner;
pub use request::{PresignRequest, PresignResponse};
