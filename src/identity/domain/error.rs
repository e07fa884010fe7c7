//! Error types for identity value validation.

use thiserror::Error;

/// Errors returned while constructing identity values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityDomainError {
    /// The user identifier is empty after trimming.
    #[error("user identifier must not be empty")]
    EmptyUserId,

    /// The user identifier exceeds the storage limit.
    #[error("user identifier exceeds 128 characters: {0}")]
    UserIdTooLong(String),

    /// The payout account identifier is empty after trimming.
    #[error("payout account identifier must not be empty")]
    EmptyPayoutAccount,

    /// The role name is not recognised.
    #[error("unknown role: {0}")]
    UnknownRole(String),
}
