//! Chat messages, including proof-of-completion photos.

use super::{ChatDomainError, ThreadId};
use crate::identity::domain::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Content of a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageBody {
    /// Optional text.
    pub text: Option<String>,
    /// Optional image reference.
    pub image_url: Option<String>,
    /// Whether the sender marked the message as completion evidence.
    pub is_proof: bool,
}

impl MessageBody {
    /// Creates a text-only body.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Creates a proof-of-completion body carrying an image.
    #[must_use]
    pub fn proof(image_url: impl Into<String>) -> Self {
        Self {
            image_url: Some(image_url.into()),
            is_proof: true,
            ..Self::default()
        }
    }
}

/// Message posted into a chat thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    id: Uuid,
    thread_id: ThreadId,
    sender_id: UserId,
    body: MessageBody,
    created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Creates a validated message.
    ///
    /// # Errors
    ///
    /// Returns [`ChatDomainError::EmptyMessage`] when the body has neither
    /// text nor image, or [`ChatDomainError::ProofWithoutImage`] when a proof
    /// message has no image.
    pub fn new(
        thread_id: ThreadId,
        sender_id: UserId,
        body: MessageBody,
        clock: &impl Clock,
    ) -> Result<Self, ChatDomainError> {
        let has_text = body.text.as_deref().is_some_and(|text| !text.trim().is_empty());
        let has_image = body
            .image_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty());
        if !has_text && !has_image {
            return Err(ChatDomainError::EmptyMessage);
        }
        if body.is_proof && !has_image {
            return Err(ChatDomainError::ProofWithoutImage);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            thread_id,
            sender_id,
            body,
            created_at: clock.utc(),
        })
    }

    /// Returns the message identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the owning thread.
    #[must_use]
    pub const fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Returns the sender.
    #[must_use]
    pub const fn sender_id(&self) -> &UserId {
        &self.sender_id
    }

    /// Returns the message body.
    #[must_use]
    pub const fn body(&self) -> &MessageBody {
        &self.body
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `true` for a proof message that carries an image.
    #[must_use]
    pub fn is_qualifying_proof(&self) -> bool {
        self.body.is_proof && self.body.image_url.is_some()
    }
}
