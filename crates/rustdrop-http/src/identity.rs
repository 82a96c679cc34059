//! Caller identity resolution.
//!
//! Authentication happens in front of this service. An [`IdentityResolver`]
//! only extracts the already-authenticated caller id from the request.

use http::HeaderName;
use http::request::Parts;

/// Default header carrying the caller id.
pub const DEFAULT_IDENTITY_HEADER: &str = "x-user-id";

/// Extracts the caller identity from request metadata.
pub trait IdentityResolver: Send + Sync + 'static {
    /// Return the caller id, or `None` when the request is unauthenticated.
    fn resolve(&self, parts: &Parts) -> Option<String>;
}

/// Reads the caller id from a trusted header set by an authenticating proxy.
#[derive(Debug, Clone)]
pub struct HeaderIdentityResolver {
    header: HeaderName,
}

impl HeaderIdentityResolver {
    /// Create a resolver reading `header`.
    ///
    /// # Errors
    ///
    /// Returns an error if `header` is not a valid header name.
    pub fn new(header: &str) -> Result<Self, http::header::InvalidHeaderName> {
        Ok(Self {
            header: HeaderName::from_bytes(header.trim().as_bytes())?,
        })
    }

    /// The header this resolver reads.
    #[must_use]
    pub fn header(&self) -> &HeaderName {
        &self.header
    }
}

impl Default for HeaderIdentityResolver {
    fn default() -> Self {
        Self {
            header: HeaderName::from_static(DEFAULT_IDENTITY_HEADER),
        }
    }
}

impl IdentityResolver for HeaderIdentityResolver {
    fn resolve(&self, parts: &Parts) -> Option<String> {
        parts
            .headers
            .get(&self.header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
    }
}
