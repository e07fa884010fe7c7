//! Caller-facing error taxonomy shared by all services.
//!
//! Service error enums keep their detailed variants for logging and tests;
//! [`ErrorKind`] is the stable category a transport layer maps to a status
//! code and a user-facing message.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed, missing, or out-of-range request fields.
    InvalidInput,
    /// A task or offer identifier does not resolve.
    NotFound,
    /// The caller lacks the required relationship to the entity.
    Forbidden,
    /// The operation is not legal for the entity's current status,
    /// including lost compare-and-set races.
    InvalidState,
    /// A side condition beyond status failed, such as missing proof.
    PreconditionFailed,
    /// The escrow gateway or another collaborator failed.
    Upstream,
    /// A credential or webhook signature was rejected.
    Unauthorized,
    /// Persistence or other infrastructure failure.
    Internal,
}

impl ErrorKind {
    /// Returns the canonical snake-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::InvalidState => "invalid_state",
            Self::PreconditionFailed => "precondition_failed",
            Self::Upstream => "upstream_error",
            Self::Unauthorized => "unauthorized",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
