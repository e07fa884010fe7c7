//! Escrow domain types shared by the gateway port and webhook handling.

mod checkout;
mod error;
mod event;
mod ids;
mod signature;

pub use checkout::{
    CheckoutRedirects, CheckoutRequest, CheckoutSession, CorrelationMetadata, RefundRequest,
    ReleaseRequest,
};
pub use error::{EscrowDomainError, EventDecodeError, SignatureError};
pub use event::{CHECKOUT_COMPLETED, CompletedCheckout, EscrowEvent, WebhookEnvelope};
pub use ids::{CheckoutSessionId, PaymentConfirmationId};
pub use signature::WebhookVerifier;
