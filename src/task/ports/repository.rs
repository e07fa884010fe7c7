//! Repository ports for tasks and their offers.

use crate::{
    error::ErrorKind,
    escrow::domain::CheckoutSessionId,
    identity::domain::UserId,
    task::domain::{Offer, OfferId, Task, TaskCategory, TaskId, TaskStatus, TaskVersion},
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Criteria for browsing tasks. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Required lifecycle status.
    pub status: Option<TaskStatus>,
    /// Required postal code.
    pub zip_code: Option<String>,
    /// Required category.
    pub category: Option<TaskCategory>,
}

impl TaskFilter {
    /// Creates a filter that matches every task.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts results to one status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts results to one postal code.
    #[must_use]
    pub fn with_zip_code(mut self, zip_code: impl Into<String>) -> Self {
        self.zip_code = Some(zip_code.into());
        self
    }

    /// Restricts results to one category.
    #[must_use]
    pub const fn with_category(mut self, category: TaskCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Returns `true` when `task` satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.status.is_none_or(|status| task.status() == status)
            && self
                .zip_code
                .as_deref()
                .is_none_or(|zip| task.details().zip_code == zip)
            && self
                .category
                .is_none_or(|category| task.details().category == category)
    }
}

/// Task persistence contract.
///
/// Every write after [`TaskRepository::store`] is a compare-and-set against
/// the version the caller read.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Replaces a task if its stored version still equals `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist
    /// or [`TaskRepositoryError::VersionConflict`] when another writer got
    /// there first.
    async fn update(&self, task: &Task, expected: TaskVersion) -> TaskRepositoryResult<()>;

    /// Applies a funding confirmation in one unit of work: writes the
    /// accepted task (compare-and-set on `expected`), marks `offer_id`
    /// accepted, and declines every other pending offer on the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::VersionConflict`] on a lost race or
    /// [`TaskRepositoryError::OfferNotFound`] when the offer is not one of
    /// the task's offers. Nothing is written on error.
    async fn accept_funding(
        &self,
        task: &Task,
        expected: TaskVersion,
        offer_id: OfferId,
    ) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Finds the task whose checkout link names `session_id`.
    async fn find_by_checkout_session(
        &self,
        session_id: &CheckoutSessionId,
    ) -> TaskRepositoryResult<Option<Task>>;

    /// Returns tasks matching `filter`, newest first.
    async fn list(&self, filter: &TaskFilter) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns tasks posted by `poster_id`, newest first.
    async fn list_by_poster(&self, poster_id: &UserId) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns tasks currently bound to `helper_id`, newest first.
    async fn list_by_helper(&self, helper_id: &UserId) -> TaskRepositoryResult<Vec<Task>>;
}

/// Offer persistence contract.
#[async_trait]
pub trait OfferRepository: Send + Sync {
    /// Stores a new offer, checking in the same unit of work that the parent
    /// task is still requested.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] for a missing parent,
    /// [`TaskRepositoryError::TaskNotOpen`] when the parent has left
    /// `requested`, or [`TaskRepositoryError::DuplicateOffer`].
    async fn store_offer(&self, offer: &Offer) -> TaskRepositoryResult<()>;

    /// Finds an offer by identifier.
    async fn find_offer(&self, id: OfferId) -> TaskRepositoryResult<Option<Offer>>;

    /// Returns a task's offers in submission order.
    async fn list_offers(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Offer>>;
}

/// Errors returned by task and offer repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// An offer with the same identifier already exists.
    #[error("duplicate offer identifier: {0}")]
    DuplicateOffer(OfferId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The offer was not found.
    #[error("offer not found: {0}")]
    OfferNotFound(OfferId),

    /// The stored task moved past the version the caller read.
    #[error("task {task_id} changed concurrently (expected {expected})")]
    VersionConflict {
        /// Contended task.
        task_id: TaskId,
        /// Version the writer expected.
        expected: TaskVersion,
    },

    /// The parent task no longer accepts offers.
    #[error("task {task_id} is not accepting offers (status {status})")]
    TaskNotOpen {
        /// Parent task.
        task_id: TaskId,
        /// Status found under the lock.
        status: TaskStatus,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns the caller-facing error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::OfferNotFound(_) => ErrorKind::NotFound,
            Self::VersionConflict { .. } | Self::TaskNotOpen { .. } => ErrorKind::InvalidState,
            Self::DuplicateTask(_) | Self::DuplicateOffer(_) | Self::Persistence(_) => {
                ErrorKind::Internal
            }
        }
    }
}
