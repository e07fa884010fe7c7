//! Verified caller identity passed into every lifecycle operation.

use super::{IdentityDomainError, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Authorization role attached to a verified caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular marketplace user acting as poster or helper.
    Member,
    /// Support staff; may read private task fields but gains no lifecycle
    /// rights.
    Admin,
}

impl Role {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Role {
    type Error = IdentityDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "member" => Ok(Self::Member),
            "admin" => Ok(Self::Admin),
            _ => Err(IdentityDomainError::UnknownRole(value.to_owned())),
        }
    }
}

/// Identity resolved by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    user_id: UserId,
    display_name: String,
    role: Role,
}

impl Caller {
    /// Creates a caller with the given role.
    ///
    /// Blank display names fall back to `Anonymous`.
    #[must_use]
    pub fn new(user_id: UserId, display_name: impl Into<String>, role: Role) -> Self {
        let raw = display_name.into();
        let trimmed = raw.trim();
        let resolved_name = if trimmed.is_empty() {
            "Anonymous".to_owned()
        } else {
            trimmed.to_owned()
        };
        Self {
            user_id,
            display_name: resolved_name,
            role,
        }
    }

    /// Creates a regular member caller.
    #[must_use]
    pub fn member(user_id: UserId, display_name: impl Into<String>) -> Self {
        Self::new(user_id, display_name, Role::Member)
    }

    /// Returns the caller's user identifier.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the caller's display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the caller's role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns `true` for support staff.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}
