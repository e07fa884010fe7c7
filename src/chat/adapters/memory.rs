//! In-memory chat store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::{
    chat::{
        domain::{ChatMessage, ChatThread, ThreadId},
        ports::{ChatError, ChatGateway, ChatResult},
    },
    task::domain::TaskId,
};

/// Thread-safe in-memory chat store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryChatStore {
    state: Arc<RwLock<ChatState>>,
}

#[derive(Debug, Default)]
struct ChatState {
    threads: HashMap<ThreadId, ChatThread>,
    task_index: HashMap<TaskId, ThreadId>,
    messages: HashMap<ThreadId, Vec<ChatMessage>>,
}

fn lock_error(err: impl ToString) -> ChatError {
    ChatError::unavailable(std::io::Error::other(err.to_string()))
}

impl InMemoryChatStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message to its thread.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::ThreadNotFound`] for unknown threads,
    /// [`ChatError::ThreadClosed`] for closed threads, or
    /// [`ChatError::NotParticipant`] when the sender is neither poster nor
    /// helper.
    pub fn post_message(&self, message: ChatMessage) -> ChatResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let thread_id = message.thread_id();
        let thread = state
            .threads
            .get(&thread_id)
            .ok_or(ChatError::ThreadNotFound(thread_id))?;
        if thread.is_closed() {
            return Err(ChatError::ThreadClosed(thread_id));
        }
        if !thread.is_participant(message.sender_id()) {
            return Err(ChatError::NotParticipant {
                thread_id,
                user_id: message.sender_id().clone(),
            });
        }
        state.messages.entry(thread_id).or_default().push(message);
        Ok(())
    }

    /// Returns the messages of a thread in posting order.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Unavailable`] when the lock is poisoned.
    pub fn messages(&self, thread_id: ThreadId) -> ChatResult<Vec<ChatMessage>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.messages.get(&thread_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ChatGateway for InMemoryChatStore {
    async fn open_thread(&self, thread: &ChatThread) -> ChatResult<ChatThread> {
        let mut state = self.state.write().map_err(lock_error)?;
        if let Some(existing) = state
            .task_index
            .get(&thread.task_id())
            .and_then(|id| state.threads.get(id))
        {
            return Ok(existing.clone());
        }
        state.task_index.insert(thread.task_id(), thread.id());
        state.threads.insert(thread.id(), thread.clone());
        Ok(thread.clone())
    }

    async fn find_thread_by_task(&self, task_id: TaskId) -> ChatResult<Option<ChatThread>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .task_index
            .get(&task_id)
            .and_then(|id| state.threads.get(id))
            .cloned())
    }

    async fn has_proof_message(&self, thread_id: ThreadId) -> ChatResult<bool> {
        let state = self.state.read().map_err(lock_error)?;
        if !state.threads.contains_key(&thread_id) {
            return Err(ChatError::ThreadNotFound(thread_id));
        }
        Ok(state
            .messages
            .get(&thread_id)
            .is_some_and(|messages| messages.iter().any(ChatMessage::is_qualifying_proof)))
    }
}
