//! Error types for task domain validation and transitions.

use super::{Money, OfferId, TaskAction, TaskId, TaskStatus};
use crate::{error::ErrorKind, escrow::domain::CheckoutSessionId};
use thiserror::Error;

/// Errors returned while constructing or transitioning task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// A required text field is empty after trimming.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// A money amount is not a positive number of cents.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The task price is below the configured minimum.
    #[error("price {price} is below the minimum of {minimum}")]
    PriceBelowMinimum {
        /// Submitted price as entered.
        price: String,
        /// Configured minimum.
        minimum: Money,
    },

    /// The platform fee percentage is outside `0..=100`.
    #[error("fee percent must be between 0 and 100, got {0}")]
    InvalidFeePercent(String),

    /// Money arithmetic overflowed.
    #[error("amount arithmetic overflowed")]
    AmountOverflow,

    /// The category is not one of the supported values.
    #[error("unknown task category: {0}")]
    UnknownCategory(String),

    /// A persisted status value is unknown.
    #[error("unknown status: {0}")]
    UnknownStatus(String),

    /// A persisted confirmation code is malformed.
    #[error("invalid confirmation code: {0}")]
    InvalidConfirmationCode(String),

    /// The task no longer accepts offers.
    #[error("task {task_id} is not accepting offers (status {status})")]
    NotAcceptingOffers {
        /// Target task.
        task_id: TaskId,
        /// Current status.
        status: TaskStatus,
    },

    /// The action is not legal in the task's current status.
    #[error("cannot {action} task {task_id} in status {status}")]
    InvalidTransition {
        /// Target task.
        task_id: TaskId,
        /// Current status.
        status: TaskStatus,
        /// Attempted action.
        action: TaskAction,
    },

    /// A payment confirmation refers to a session other than the task's
    /// current checkout.
    #[error("checkout session {session_id} does not belong to task {task_id}")]
    CheckoutMismatch {
        /// Target task.
        task_id: TaskId,
        /// Session named by the confirmation.
        session_id: CheckoutSessionId,
    },

    /// The offer has already been settled.
    #[error("offer {offer_id} is no longer pending (status {status})")]
    OfferNotPending {
        /// Target offer.
        offer_id: OfferId,
        /// Current offer status.
        status: &'static str,
    },
}

impl TaskDomainError {
    /// Returns the caller-facing error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyField(_)
            | Self::InvalidAmount(_)
            | Self::PriceBelowMinimum { .. }
            | Self::InvalidFeePercent(_)
            | Self::AmountOverflow
            | Self::UnknownCategory(_)
            | Self::UnknownStatus(_)
            | Self::InvalidConfirmationCode(_) => ErrorKind::InvalidInput,
            Self::NotAcceptingOffers { .. }
            | Self::InvalidTransition { .. }
            | Self::CheckoutMismatch { .. }
            | Self::OfferNotPending { .. } => ErrorKind::InvalidState,
        }
    }
}

/// Error returned while parsing status values from persistence or requests.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown status value: {0}")]
pub struct ParseStatusError(pub String);
