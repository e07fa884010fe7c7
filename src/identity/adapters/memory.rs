//! In-memory payout directory for tests and local development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::identity::{
    domain::{PayoutProfile, UserId},
    ports::{PayoutDirectory, PayoutDirectoryError, PayoutDirectoryResult},
};

/// Thread-safe in-memory payout directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPayoutDirectory {
    profiles: Arc<RwLock<HashMap<UserId, PayoutProfile>>>,
}

impl InMemoryPayoutDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records or replaces the payout profile for a user.
    ///
    /// # Errors
    ///
    /// Returns [`PayoutDirectoryError::Unavailable`] when the lock is
    /// poisoned.
    pub fn register(&self, user_id: UserId, profile: PayoutProfile) -> PayoutDirectoryResult<()> {
        let mut profiles = self.profiles.write().map_err(|err| {
            PayoutDirectoryError::unavailable(std::io::Error::other(err.to_string()))
        })?;
        profiles.insert(user_id, profile);
        Ok(())
    }
}

#[async_trait]
impl PayoutDirectory for InMemoryPayoutDirectory {
    async fn payout_profile(
        &self,
        user_id: &UserId,
    ) -> PayoutDirectoryResult<Option<PayoutProfile>> {
        let profiles = self.profiles.read().map_err(|err| {
            PayoutDirectoryError::unavailable(std::io::Error::other(err.to_string()))
        })?;
        Ok(profiles.get(user_id).cloned())
    }
}
