//! Escrow gateway port.

use crate::escrow::domain::{
    CheckoutRequest, CheckoutSession, CheckoutSessionId, RefundRequest, ReleaseRequest,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for escrow gateway calls.
pub type EscrowGatewayResult<T> = Result<T, EscrowGatewayError>;

/// Hosted-checkout escrow provided by the payment processor.
#[async_trait]
pub trait EscrowGateway: Send + Sync {
    /// Opens a hosted checkout that holds the payment in escrow.
    async fn create_checkout(&self, request: &CheckoutRequest)
    -> EscrowGatewayResult<CheckoutSession>;

    /// Invalidates a checkout that must no longer accept payment.
    async fn expire_checkout(&self, session_id: &CheckoutSessionId) -> EscrowGatewayResult<()>;

    /// Releases escrowed funds to the helper.
    async fn release(&self, request: &ReleaseRequest) -> EscrowGatewayResult<()>;

    /// Refunds a captured payment to the poster.
    ///
    /// A payment that was already refunded is rejected rather than refunded
    /// twice.
    async fn refund(&self, request: &RefundRequest) -> EscrowGatewayResult<()>;
}

/// Errors returned by escrow gateway implementations.
#[derive(Debug, Clone, Error)]
pub enum EscrowGatewayError {
    /// The gateway rejected the request.
    #[error("escrow gateway rejected request: {0}")]
    Rejected(String),

    /// The gateway could not be reached or failed internally.
    #[error("escrow gateway unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl EscrowGatewayError {
    /// Wraps a transport error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
