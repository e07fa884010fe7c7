//! Error types for escrow values, webhook decoding, and signatures.

use thiserror::Error;

/// Errors returned while constructing escrow identifiers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EscrowDomainError {
    /// The checkout session identifier is empty after trimming.
    #[error("checkout session identifier must not be empty")]
    EmptySessionId,

    /// The payment confirmation identifier is empty after trimming.
    #[error("payment confirmation identifier must not be empty")]
    EmptyPaymentId,
}

/// Errors returned while decoding a verified webhook body.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EventDecodeError {
    /// The body is not a webhook envelope.
    #[error("malformed webhook envelope: {0}")]
    MalformedEnvelope(String),

    /// A recognised event carries an object missing required fields.
    #[error("malformed {event_type} object: {reason}")]
    MalformedObject {
        /// Event type whose object failed to decode.
        event_type: String,
        /// Decoder message.
        reason: String,
    },
}

/// Errors returned by webhook signature verification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// The signing secret is empty.
    #[error("webhook signing secret must not be empty")]
    EmptySecret,

    /// No signature header accompanied the request.
    #[error("missing webhook signature header")]
    MissingHeader,

    /// The header lacks a timestamp or a `v1` signature.
    #[error("malformed webhook signature header")]
    MalformedHeader,

    /// The signed timestamp is outside the accepted window.
    #[error("webhook timestamp {timestamp} is outside the {tolerance_secs}s tolerance")]
    TimestampOutOfTolerance {
        /// Signed Unix timestamp.
        timestamp: i64,
        /// Accepted skew in seconds.
        tolerance_secs: i64,
    },

    /// No signature in the header matches the payload.
    #[error("webhook signature does not match payload")]
    Mismatch,
}
