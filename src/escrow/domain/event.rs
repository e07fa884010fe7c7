//! Webhook event envelope and the events the lifecycle engine acts on.

use super::{CheckoutSessionId, CorrelationMetadata, EventDecodeError, PaymentConfirmationId};
use serde::{Deserialize, Serialize};

/// Event type emitted when a hosted checkout captures payment.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Outer JSON document delivered by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    /// Gateway event identifier.
    pub id: String,
    /// Event type, such as [`CHECKOUT_COMPLETED`].
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event payload. Only read for event types the engine acts on.
    #[serde(default)]
    pub data: WebhookEventData,
}

/// Payload wrapper inside a webhook envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookEventData {
    /// Event-specific object; `null` when absent.
    #[serde(default)]
    pub object: serde_json::Value,
}

impl WebhookEnvelope {
    /// Wraps a completed checkout in an envelope, as the gateway sends it.
    ///
    /// # Errors
    ///
    /// Returns [`EventDecodeError::MalformedObject`] when the checkout
    /// cannot be encoded.
    pub fn checkout_completed(
        event_id: impl Into<String>,
        checkout: &CompletedCheckout,
    ) -> Result<Self, EventDecodeError> {
        let object =
            serde_json::to_value(checkout).map_err(|err| EventDecodeError::MalformedObject {
                event_type: CHECKOUT_COMPLETED.to_owned(),
                reason: err.to_string(),
            })?;
        Ok(Self {
            id: event_id.into(),
            event_type: CHECKOUT_COMPLETED.to_owned(),
            data: WebhookEventData { object },
        })
    }
}

/// Checkout session object carried by a completion event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedCheckout {
    /// Completed session.
    pub id: CheckoutSessionId,
    /// Captured payment identifier.
    pub payment_intent: PaymentConfirmationId,
    /// Correlation data supplied when the session was created.
    pub metadata: CorrelationMetadata,
}

/// Decoded webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscrowEvent {
    /// A checkout captured payment.
    CheckoutCompleted {
        /// Gateway event identifier.
        event_id: String,
        /// Completed session details.
        checkout: CompletedCheckout,
    },
    /// Any event type the engine does not act on.
    Other {
        /// Gateway event identifier.
        event_id: String,
        /// Event type as delivered.
        event_type: String,
    },
}

impl EscrowEvent {
    /// Decodes a verified webhook body.
    ///
    /// Only the object of a recognised event type is decoded; other event
    /// types are returned as [`EscrowEvent::Other`] without inspecting their
    /// payload.
    ///
    /// # Errors
    ///
    /// Returns [`EventDecodeError`] when the envelope, or the object of a
    /// recognised event, is malformed.
    pub fn decode(payload: &[u8]) -> Result<Self, EventDecodeError> {
        let envelope: WebhookEnvelope = serde_json::from_slice(payload)
            .map_err(|err| EventDecodeError::MalformedEnvelope(err.to_string()))?;

        if envelope.event_type != CHECKOUT_COMPLETED {
            return Ok(Self::Other {
                event_id: envelope.id,
                event_type: envelope.event_type,
            });
        }

        let checkout = serde_json::from_value::<CompletedCheckout>(envelope.data.object)
            .map_err(|err| EventDecodeError::MalformedObject {
                event_type: envelope.event_type.clone(),
                reason: err.to_string(),
            })?;
        Ok(Self::CheckoutCompleted {
            event_id: envelope.id,
            checkout,
        })
    }

    /// Returns the gateway event identifier.
    #[must_use]
    pub fn event_id(&self) -> &str {
        match self {
            Self::CheckoutCompleted { event_id, .. } | Self::Other { event_id, .. } => event_id,
        }
    }
}
