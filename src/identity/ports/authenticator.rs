//! Authentication port turning inbound credentials into a verified caller.

use crate::{
    error::ErrorKind,
    identity::domain::{Caller, IdentityDomainError},
};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type for authentication operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Verifies a bearer credential and resolves the caller behind it.
///
/// Implementations must reject any credential they cannot verify; the core
/// never trusts an unauthenticated user identifier.
pub trait Authenticator: Send + Sync {
    /// Resolves the caller for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] when the token is missing, malformed,
    /// forged, or expired.
    fn authenticate(&self, bearer_token: &str) -> IdentityResult<Caller>;
}

/// Errors returned by authenticators.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// No credential was supplied.
    #[error("missing credentials")]
    MissingCredentials,

    /// The token structure could not be decoded.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The token signature does not match.
    #[error("token signature is invalid")]
    InvalidSignature,

    /// The token expired.
    #[error("token expired at {0}")]
    Expired(DateTime<Utc>),

    /// The signing secret is unusable.
    #[error("token signing secret must not be empty")]
    EmptySecret,

    /// The token claims carry invalid identity values.
    #[error(transparent)]
    Domain(#[from] IdentityDomainError),
}

impl IdentityError {
    /// Returns the caller-facing error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptySecret => ErrorKind::Internal,
            _ => ErrorKind::Unauthorized,
        }
    }
}
