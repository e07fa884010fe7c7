//! Chat gateway port consumed by the lifecycle engine.

use crate::{
    chat::domain::{ChatDomainError, ChatThread, ThreadId},
    identity::domain::UserId,
    task::domain::TaskId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for chat gateway operations.
pub type ChatResult<T> = Result<T, ChatError>;

/// Chat subsystem operations the engine depends on.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Opens the thread for a task.
    ///
    /// Idempotent per task: when a thread already exists for
    /// `thread.task_id()`, the existing thread is returned unchanged.
    async fn open_thread(&self, thread: &ChatThread) -> ChatResult<ChatThread>;

    /// Finds the thread for a task.
    async fn find_thread_by_task(&self, task_id: TaskId) -> ChatResult<Option<ChatThread>>;

    /// Returns `true` when the thread holds a proof message with an image.
    async fn has_proof_message(&self, thread_id: ThreadId) -> ChatResult<bool>;
}

/// Errors returned by chat gateway implementations.
#[derive(Debug, Clone, Error)]
pub enum ChatError {
    /// The thread does not exist.
    #[error("chat thread not found: {0}")]
    ThreadNotFound(ThreadId),

    /// The sender is not a participant of the thread.
    #[error("user {user_id} is not a participant of thread {thread_id}")]
    NotParticipant {
        /// Thread being written to.
        thread_id: ThreadId,
        /// Rejected sender.
        user_id: UserId,
    },

    /// The thread no longer accepts messages.
    #[error("chat thread {0} is closed")]
    ThreadClosed(ThreadId),

    /// Message validation failed.
    #[error(transparent)]
    Domain(#[from] ChatDomainError),

    /// The chat backend failed.
    #[error("chat backend unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl ChatError {
    /// Wraps a backend error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
