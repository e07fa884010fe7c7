//! Identifiers issued by the payment processor.

use super::EscrowDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CheckoutSessionId(String);

impl CheckoutSessionId {
    /// Creates a validated session identifier.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowDomainError::EmptySessionId`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, EscrowDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(EscrowDomainError::EmptySessionId);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CheckoutSessionId {
    type Error = EscrowDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CheckoutSessionId> for String {
    fn from(value: CheckoutSessionId) -> Self {
        value.0
    }
}

impl fmt::Display for CheckoutSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the captured payment backing a completed checkout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PaymentConfirmationId(String);

impl PaymentConfirmationId {
    /// Creates a validated payment confirmation identifier.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowDomainError::EmptyPaymentId`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, EscrowDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(EscrowDomainError::EmptyPaymentId);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PaymentConfirmationId {
    type Error = EscrowDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PaymentConfirmationId> for String {
    fn from(value: PaymentConfirmationId) -> Self {
        value.0
    }
}

impl fmt::Display for PaymentConfirmationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
