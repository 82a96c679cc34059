//! Caller identity to key namespace mapping.

use std::fmt;

use crate::error::{PresignError, PresignResult};

/// A per-caller key prefix containing only `[A-Za-z0-9_-]`.
///
/// Every object key issued for a caller starts with `{namespace}/`, which is
/// what keeps one caller from overwriting another's objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityNamespace(String);

impl IdentityNamespace {
    /// Derive the namespace from an opaque caller identifier.
    ///
    /// Every character outside `[A-Za-z0-9_-]` is replaced by `_`.
    ///
    /// # Errors
    ///
    /// Returns [`PresignError::Unauthenticated`] if the identifier is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use rustdrop_core::IdentityNamespace;
    ///
    /// let ns = IdentityNamespace::from_identity("user@example.com").unwrap();
    /// assert_eq!(ns.as_str(), "user_example_com");
    /// ```
    pub fn from_identity(identity: &str) -> PresignResult<Self> {
        if identity.is_empty() {
            return Err(PresignError::Unauthenticated);
        }
        let sanitized = identity
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        Ok(Self(sanitized))
    }

    /// The namespace as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
