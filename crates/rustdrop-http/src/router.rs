//! Request router.
//!
//! The surface is small: one presign endpoint, a health check, and CORS
//! preflight on any path.

/// Path of the presign endpoint.
pub const PRESIGN_PATH: &str = "/api/presign";

/// Path of the health check endpoint.
pub const HEALTH_PATH: &str = "/health";

/// A resolved route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `POST /api/presign`.
    Presign,
    /// `GET /health`.
    Health,
    /// `OPTIONS` on any path.
    Preflight,
}

/// Routing failures.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RouteError {
    /// No route matches the path.
    #[error("Cannot find any route matching {path}")]
    NotFound {
        /// The requested path.
        path: String,
    },

    /// The path exists but does not accept the method.
    #[error("Method {method} is not allowed on {path}")]
    MethodNotAllowed {
        /// The requested method.
        method: String,
        /// The requested path.
        path: String,
        /// Value for the `Allow` response header.
        allow: &'static str,
    },
}

impl RouteError {
    /// HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> http::StatusCode {
        match self {
            Self::NotFound { .. } => http::StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => http::StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

/// Resolve the route for a method and path.
///
/// A single trailing slash on the path is ignored.
///
/// # Errors
///
/// Returns [`RouteError::NotFound`] for unknown paths and
/// [`RouteError::MethodNotAllowed`] for known paths with the wrong method.
pub fn resolve_route(method: &http::Method, path: &str) -> Result<Route, RouteError> {
    if method == http::Method::OPTIONS {
        return Ok(Route::Preflight);
    }

    let normalized = match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => path,
    };

    let (route, expected, allow) = match normalized {
        PRESIGN_PATH => (Route::Presign, http::Method::POST, "POST, OPTIONS"),
        HEALTH_PATH => (Route::Health, http::Method::GET, "GET, HEAD, OPTIONS"),
        _ => {
            return Err(RouteError::NotFound {
                path: path.to_owned(),
            });
        }
    };

    if *method == expected || (route == Route::Health && method == http::Method::HEAD) {
        Ok(route)
    } else {
        Err(RouteError::MethodNotAllowed {
            method: method.to_string(),
            path: path.to_owned(),
            allow,
        })
    }
}
