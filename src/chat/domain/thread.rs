//! Chat thread opened between poster and helper.

use crate::{identity::domain::UserId, task::domain::TaskId};
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a chat thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(Uuid);

impl ThreadId {
    /// Creates a new random thread identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a thread identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ThreadId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Conversation between the poster and the assigned helper of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatThread {
    id: ThreadId,
    task_id: TaskId,
    poster_id: UserId,
    helper_id: UserId,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    closed: bool,
}

impl ChatThread {
    /// Opens a thread that expires `window` after creation.
    #[must_use]
    pub fn open(
        task_id: TaskId,
        poster_id: UserId,
        helper_id: UserId,
        window: Duration,
        clock: &impl Clock,
    ) -> Self {
        let created_at = clock.utc();
        Self {
            id: ThreadId::new(),
            task_id,
            poster_id,
            helper_id,
            created_at,
            expires_at: created_at + window,
            closed: false,
        }
    }

    /// Returns the thread identifier.
    #[must_use]
    pub const fn id(&self) -> ThreadId {
        self.id
    }

    /// Returns the task this thread belongs to.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the poster participant.
    #[must_use]
    pub const fn poster_id(&self) -> &UserId {
        &self.poster_id
    }

    /// Returns the helper participant.
    #[must_use]
    pub const fn helper_id(&self) -> &UserId {
        &self.helper_id
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the expiry timestamp.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns `true` once the thread has been closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns `true` when `user_id` is the poster or the helper.
    #[must_use]
    pub fn is_participant(&self, user_id: &UserId) -> bool {
        &self.poster_id == user_id || &self.helper_id == user_id
    }
}
