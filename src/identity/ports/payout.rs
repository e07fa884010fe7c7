//! Port answering whether a helper can receive escrow payouts.

use crate::identity::domain::{PayoutProfile, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for payout directory lookups.
pub type PayoutDirectoryResult<T> = Result<T, PayoutDirectoryError>;

/// Lookup of connected-account provisioning state per user.
#[async_trait]
pub trait PayoutDirectory: Send + Sync {
    /// Returns the payout profile for a user.
    ///
    /// Returns `None` when the user never started payout onboarding.
    async fn payout_profile(&self, user_id: &UserId)
    -> PayoutDirectoryResult<Option<PayoutProfile>>;
}

/// Errors returned by payout directory implementations.
#[derive(Debug, Clone, Error)]
pub enum PayoutDirectoryError {
    /// The directory backend failed.
    #[error("payout directory unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl PayoutDirectoryError {
    /// Wraps a backend error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
