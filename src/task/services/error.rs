//! Service-level errors for lifecycle commands.

use crate::{
    chat::ports::ChatError,
    error::ErrorKind,
    escrow::ports::EscrowGatewayError,
    identity::{domain::UserId, ports::PayoutDirectoryError},
    task::{
        domain::{OfferId, TaskAction, TaskDomainError, TaskId},
        ports::TaskRepositoryError,
    },
};
use thiserror::Error;

/// Errors returned by [`super::TaskLifecycleService`].
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Domain validation or a state transition failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),

    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The offer does not exist or belongs to another task.
    #[error("offer not found: {0}")]
    OfferNotFound(OfferId),

    /// The caller lacks the relationship the action requires.
    #[error("user {user_id} may not {action} this task")]
    Forbidden {
        /// Rejected caller.
        user_id: UserId,
        /// Attempted action.
        action: TaskAction,
    },

    /// The chosen helper cannot receive payouts yet.
    #[error("helper {0} is not payout-ready")]
    HelperNotPayoutReady(UserId),

    /// The task needs a proof photo in chat before completion.
    #[error("proof photo required before completing task {0}")]
    ProofRequired(TaskId),

    /// The escrow gateway failed.
    #[error(transparent)]
    Escrow(#[from] EscrowGatewayError),

    /// The chat subsystem failed.
    #[error(transparent)]
    Chat(#[from] ChatError),

    /// The payout directory failed.
    #[error(transparent)]
    Payout(#[from] PayoutDirectoryError),
}

impl TaskLifecycleError {
    /// Returns the caller-facing error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(err) => err.kind(),
            Self::Repository(err) => err.kind(),
            Self::TaskNotFound(_) | Self::OfferNotFound(_) => ErrorKind::NotFound,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::HelperNotPayoutReady(_) | Self::ProofRequired(_) => {
                ErrorKind::PreconditionFailed
            }
            Self::Escrow(_) | Self::Chat(_) | Self::Payout(_) => ErrorKind::Upstream,
        }
    }
}

/// Result type for lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;
