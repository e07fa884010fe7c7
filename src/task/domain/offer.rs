//! Helper offers on a requested task.

use super::{Money, OfferId, ParseStatusError, Task, TaskDomainError, TaskId};
use crate::identity::domain::{Caller, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Offer lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    /// Awaiting the poster's choice.
    Pending,
    /// Chosen and funded.
    Accepted,
    /// Another offer was funded.
    Declined,
}

impl OfferStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }
}

impl TryFrom<&str> for OfferStatus {
    type Error = ParseStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            _ => Err(ParseStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A helper's bid to do a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    id: OfferId,
    task_id: TaskId,
    helper_id: UserId,
    helper_name: String,
    note: String,
    proposed_price: Option<Money>,
    status: OfferStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedOfferData {
    /// Persisted offer identifier.
    pub id: OfferId,
    /// Persisted parent task.
    pub task_id: TaskId,
    /// Persisted helper.
    pub helper_id: UserId,
    /// Persisted helper display name.
    pub helper_name: String,
    /// Persisted note.
    pub note: String,
    /// Persisted counter-price, if any.
    pub proposed_price: Option<Money>,
    /// Persisted status.
    pub status: OfferStatus,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    /// Creates a pending offer from `helper` on `task`.
    ///
    /// The proposed price is informational; checkout always charges the
    /// task price.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NotAcceptingOffers`] unless the task is
    /// requested, or [`TaskDomainError::InvalidAmount`] for a non-positive
    /// proposed price.
    pub fn submit(
        task: &Task,
        helper: &Caller,
        note: &str,
        proposed_price: Option<Decimal>,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        task.ensure_accepting_offers()?;
        let price = proposed_price.map(Money::from_decimal).transpose()?;
        let timestamp = clock.utc();
        Ok(Self {
            id: OfferId::new(),
            task_id: task.id(),
            helper_id: helper.user_id().clone(),
            helper_name: helper.display_name().to_owned(),
            note: note.trim().to_owned(),
            proposed_price: price,
            status: OfferStatus::Pending,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs an offer from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedOfferData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            helper_id: data.helper_id,
            helper_name: data.helper_name,
            note: data.note,
            proposed_price: data.proposed_price,
            status: data.status,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the offer identifier.
    #[must_use]
    pub const fn id(&self) -> OfferId {
        self.id
    }

    /// Returns the parent task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the offering helper.
    #[must_use]
    pub const fn helper_id(&self) -> &UserId {
        &self.helper_id
    }

    /// Returns the helper display name.
    #[must_use]
    pub fn helper_name(&self) -> &str {
        &self.helper_name
    }

    /// Returns the helper's note.
    #[must_use]
    pub fn note(&self) -> &str {
        &self.note
    }

    /// Returns the counter-price, if one was proposed.
    #[must_use]
    pub const fn proposed_price(&self) -> Option<Money> {
        self.proposed_price
    }

    /// Returns the offer status.
    #[must_use]
    pub const fn status(&self) -> OfferStatus {
        self.status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Marks the offer as the funded one, as of the funding time `at`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::OfferNotPending`] if already settled.
    pub fn accept(&mut self, at: DateTime<Utc>) -> Result<(), TaskDomainError> {
        self.settle(OfferStatus::Accepted, at)
    }

    /// Marks the offer as passed over, as of the funding time `at`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::OfferNotPending`] if already settled.
    pub fn decline(&mut self, at: DateTime<Utc>) -> Result<(), TaskDomainError> {
        self.settle(OfferStatus::Declined, at)
    }

    /// Fails unless the offer still awaits a decision.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::OfferNotPending`] if already settled.
    pub const fn ensure_pending(&self) -> Result<(), TaskDomainError> {
        match self.status {
            OfferStatus::Pending => Ok(()),
            OfferStatus::Accepted | OfferStatus::Declined => {
                Err(TaskDomainError::OfferNotPending {
                    offer_id: self.id,
                    status: self.status.as_str(),
                })
            }
        }
    }

    fn settle(&mut self, status: OfferStatus, at: DateTime<Utc>) -> Result<(), TaskDomainError> {
        self.ensure_pending()?;
        self.status = status;
        self.updated_at = at;
        Ok(())
    }
}
