//! In-memory escrow gateway that records every call.
//!
//! Used by tests and local development. It can also fabricate the
//! completion webhook a real processor would deliver for a session.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::escrow::{
    domain::{
        CheckoutRequest, CheckoutSession, CheckoutSessionId, CompletedCheckout,
        PaymentConfirmationId, RefundRequest, ReleaseRequest, WebhookEnvelope,
    },
    ports::{EscrowGateway, EscrowGatewayError, EscrowGatewayResult},
};

/// Thread-safe recording escrow gateway.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEscrowGateway {
    state: Arc<RwLock<GatewayState>>,
}

#[derive(Debug, Default)]
struct GatewayState {
    checkouts: HashMap<CheckoutSessionId, CheckoutRequest>,
    checkout_order: Vec<CheckoutSessionId>,
    expired: Vec<CheckoutSessionId>,
    releases: Vec<ReleaseRequest>,
    refunds: Vec<RefundRequest>,
    fail_checkouts: bool,
    fail_settlements: bool,
}

impl InMemoryEscrowGateway {
    /// Creates a gateway with no recorded calls.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> EscrowGatewayResult<RwLockReadGuard<'_, GatewayState>> {
        self.state
            .read()
            .map_err(|err| EscrowGatewayError::unavailable(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> EscrowGatewayResult<RwLockWriteGuard<'_, GatewayState>> {
        self.state
            .write()
            .map_err(|err| EscrowGatewayError::unavailable(std::io::Error::other(err.to_string())))
    }

    /// Makes subsequent checkout creation fail until reset.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowGatewayError::Unavailable`] when the lock is poisoned.
    pub fn set_fail_checkouts(&self, fail: bool) -> EscrowGatewayResult<()> {
        self.write()?.fail_checkouts = fail;
        Ok(())
    }

    /// Makes subsequent release and refund calls fail until reset.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowGatewayError::Unavailable`] when the lock is poisoned.
    pub fn set_fail_settlements(&self, fail: bool) -> EscrowGatewayResult<()> {
        self.write()?.fail_settlements = fail;
        Ok(())
    }

    /// Returns the request that opened a session.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowGatewayError::Unavailable`] when the lock is poisoned.
    pub fn checkout(
        &self,
        session_id: &CheckoutSessionId,
    ) -> EscrowGatewayResult<Option<CheckoutRequest>> {
        Ok(self.read()?.checkouts.get(session_id).cloned())
    }

    /// Returns every opened session in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowGatewayError::Unavailable`] when the lock is poisoned.
    pub fn checkout_sessions(&self) -> EscrowGatewayResult<Vec<CheckoutSessionId>> {
        Ok(self.read()?.checkout_order.clone())
    }

    /// Returns sessions the engine asked to expire.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowGatewayError::Unavailable`] when the lock is poisoned.
    pub fn expired_sessions(&self) -> EscrowGatewayResult<Vec<CheckoutSessionId>> {
        Ok(self.read()?.expired.clone())
    }

    /// Returns recorded release requests.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowGatewayError::Unavailable`] when the lock is poisoned.
    pub fn releases(&self) -> EscrowGatewayResult<Vec<ReleaseRequest>> {
        Ok(self.read()?.releases.clone())
    }

    /// Returns recorded refund requests.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowGatewayError::Unavailable`] when the lock is poisoned.
    pub fn refunds(&self) -> EscrowGatewayResult<Vec<RefundRequest>> {
        Ok(self.read()?.refunds.clone())
    }

    /// Builds the completion webhook the processor would send once the
    /// poster pays for `session_id`.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowGatewayError::Rejected`] when the session is unknown or
    /// the event cannot be encoded.
    pub fn completion_event(
        &self,
        session_id: &CheckoutSessionId,
        payment_id: PaymentConfirmationId,
    ) -> EscrowGatewayResult<WebhookEnvelope> {
        let request = self.checkout(session_id)?.ok_or_else(|| {
            EscrowGatewayError::Rejected(format!("unknown checkout session {session_id}"))
        })?;
        let checkout = CompletedCheckout {
            id: session_id.clone(),
            payment_intent: payment_id,
            metadata: request.metadata,
        };
        WebhookEnvelope::checkout_completed(format!("evt_{}", Uuid::new_v4().simple()), &checkout)
            .map_err(|err| EscrowGatewayError::Rejected(err.to_string()))
    }
}

#[async_trait]
impl EscrowGateway for InMemoryEscrowGateway {
    async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> EscrowGatewayResult<CheckoutSession> {
        let mut state = self.write()?;
        if state.fail_checkouts {
            return Err(EscrowGatewayError::Rejected(
                "checkout creation disabled".to_owned(),
            ));
        }
        let session_id = CheckoutSessionId::new(format!("cs_{}", Uuid::new_v4().simple()))
            .map_err(|err| EscrowGatewayError::Rejected(err.to_string()))?;
        let redirect_url = format!("https://checkout.example.com/pay/{session_id}");
        state.checkouts.insert(session_id.clone(), request.clone());
        state.checkout_order.push(session_id.clone());
        Ok(CheckoutSession {
            id: session_id,
            redirect_url,
        })
    }

    async fn expire_checkout(&self, session_id: &CheckoutSessionId) -> EscrowGatewayResult<()> {
        let mut state = self.write()?;
        if !state.checkouts.contains_key(session_id) {
            return Err(EscrowGatewayError::Rejected(format!(
                "unknown checkout session {session_id}"
            )));
        }
        state.expired.push(session_id.clone());
        Ok(())
    }

    async fn release(&self, request: &ReleaseRequest) -> EscrowGatewayResult<()> {
        let mut state = self.write()?;
        if state.fail_settlements {
            return Err(EscrowGatewayError::Rejected("release disabled".to_owned()));
        }
        state.releases.push(request.clone());
        Ok(())
    }

    async fn refund(&self, request: &RefundRequest) -> EscrowGatewayResult<()> {
        let mut state = self.write()?;
        if state.fail_settlements {
            return Err(EscrowGatewayError::Rejected("refund disabled".to_owned()));
        }
        if state
            .refunds
            .iter()
            .any(|refund| refund.payment_id == request.payment_id)
        {
            return Err(EscrowGatewayError::Rejected(format!(
                "payment {} already refunded",
                request.payment_id
            )));
        }
        state.refunds.push(request.clone());
        Ok(())
    }
}
