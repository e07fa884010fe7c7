//! Identifier types for marketplace users and their payout destinations.

use super::IdentityDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length for a user identifier, matching the `VARCHAR(128)` columns.
const MAX_USER_ID_LENGTH: usize = 128;

/// Opaque identifier of a marketplace user.
///
/// User identifiers are issued by the external identity provider, so the
/// domain treats them as trimmed, non-empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Creates a validated user identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::EmptyUserId`] when the value is empty
    /// after trimming, or [`IdentityDomainError::UserIdTooLong`] when it
    /// exceeds 128 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(IdentityDomainError::EmptyUserId);
        }
        if normalized.chars().count() > MAX_USER_ID_LENGTH {
            return Err(IdentityDomainError::UserIdTooLong(raw));
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = IdentityDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Connected-account identifier that receives a helper's payout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayoutAccountId(String);

impl PayoutAccountId {
    /// Creates a validated payout account identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::EmptyPayoutAccount`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(IdentityDomainError::EmptyPayoutAccount);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PayoutAccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payout provisioning state of a user's connected account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutProfile {
    /// Destination account for escrow transfers.
    pub account_id: PayoutAccountId,
    /// Whether the processor has enabled payouts for the account.
    pub payouts_enabled: bool,
}

impl PayoutProfile {
    /// Creates a profile for an onboarded account.
    #[must_use]
    pub const fn new(account_id: PayoutAccountId, payouts_enabled: bool) -> Self {
        Self {
            account_id,
            payouts_enabled,
        }
    }

    /// Returns the destination account when the profile can receive funds.
    #[must_use]
    pub const fn payout_destination(&self) -> Option<&PayoutAccountId> {
        if self.payouts_enabled {
            Some(&self.account_id)
        } else {
            None
        }
    }
}
