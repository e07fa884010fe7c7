//! Flat status values derived from task and offer state.

use super::{ParseStatusError, TaskDomainError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status used for filtering and storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Open for offers.
    Requested,
    /// Funded and bound to a helper.
    Accepted,
    /// The helper has started work.
    InProgress,
    /// Work has been marked done.
    Completed,
    /// Withdrawn before completion.
    Canceled,
    /// Completion is contested.
    Disputed,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Accepted => "accepted",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
            Self::Disputed => "disputed",
        }
    }

    /// Returns `true` when a helper is bound to the task.
    #[must_use]
    pub const fn has_helper(self) -> bool {
        matches!(
            self,
            Self::Accepted | Self::InProgress | Self::Completed | Self::Disputed
        )
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "requested" => Ok(Self::Requested),
            "accepted" => Ok(Self::Accepted),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "canceled" | "cancelled" => Ok(Self::Canceled),
            "disputed" => Ok(Self::Disputed),
            _ => Err(ParseStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment position of a task, derived from its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// No funds captured.
    Pending,
    /// Funds held in escrow or released.
    Paid,
    /// Captured funds returned to the poster.
    Refunded,
}

impl PaymentStatus {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Party withdrawing from a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelingParty {
    /// The task's poster.
    Poster,
    /// The assigned helper.
    Helper,
}

impl CancelingParty {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Poster => "poster",
            Self::Helper => "helper",
        }
    }
}

impl TryFrom<&str> for CancelingParty {
    type Error = ParseStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "poster" => Ok(Self::Poster),
            "helper" => Ok(Self::Helper),
            _ => Err(ParseStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for CancelingParty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action attempted against a task, used in transition errors and
/// authorization failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskAction {
    /// Submitting an offer.
    SubmitOffer,
    /// Selecting a helper and opening checkout.
    ChooseHelper,
    /// Applying a payment confirmation.
    ConfirmFunding,
    /// Starting work.
    StartWork,
    /// Marking the task done.
    Complete,
    /// Withdrawing from the task.
    Cancel,
    /// Contesting completion.
    Dispute,
}

impl TaskAction {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SubmitOffer => "submit_offer",
            Self::ChooseHelper => "choose_helper",
            Self::ConfirmFunding => "confirm_funding",
            Self::StartWork => "start_work",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
            Self::Dispute => "dispute",
        }
    }
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ParseStatusError> for TaskDomainError {
    fn from(err: ParseStatusError) -> Self {
        Self::UnknownStatus(err.0)
    }
}
