//! Intake of signed escrow webhooks.
//!
//! The gateway redelivers events until it sees a success response, so every
//! outcome other than a bad signature or an undecodable body is
//! acknowledged. Replays settle on [`WebhookOutcome::AlreadyProcessed`].

use super::settlement::refund_quietly;
use crate::{
    chat::{domain::ChatThread, ports::ChatGateway},
    error::ErrorKind,
    escrow::{
        domain::{CompletedCheckout, EscrowEvent, EventDecodeError, SignatureError, WebhookVerifier},
        ports::EscrowGateway,
    },
    task::{
        domain::{RefundRecord, Task, TaskDomainError, TaskStatus},
        ports::{OfferRepository, TaskRepository, TaskRepositoryError},
    },
};
use chrono::Duration;
use mockable::Clock;
use std::{fmt, sync::Arc};
use thiserror::Error;

const MAX_ATTEMPTS: usize = 2;

/// How an acknowledged webhook was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Payment bound the chosen helper.
    Accepted,
    /// The payment had already been applied.
    AlreadyProcessed,
    /// Payment arrived after cancellation and was refunded.
    RefundedLatePayment,
    /// Payment completed on a checkout the poster had since replaced and was
    /// refunded.
    RefundedSupersededPayment,
    /// Neither the session nor its correlated task is known.
    UnknownSession,
    /// Correlation metadata disagrees with the stored checkout.
    MetadataMismatch,
    /// Event type the engine does not act on.
    Ignored,
}

impl WebhookOutcome {
    /// Returns the outcome label used in logs and responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::AlreadyProcessed => "already_processed",
            Self::RefundedLatePayment => "refunded_late_payment",
            Self::RefundedSupersededPayment => "refunded_superseded_payment",
            Self::UnknownSession => "unknown_session",
            Self::MetadataMismatch => "metadata_mismatch",
            Self::Ignored => "ignored",
        }
    }
}

impl fmt::Display for WebhookOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that make a webhook delivery fail.
#[derive(Debug, Clone, Error)]
pub enum WebhookError {
    /// The signature header is missing, stale, or wrong.
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// The verified body is not a usable event.
    #[error(transparent)]
    Decode(#[from] EventDecodeError),

    /// The stored task rejected the transition.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// Persistence failed or the race retry was exhausted.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
}

impl WebhookError {
    /// Maps the error to its caller-facing kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Signature(_) => ErrorKind::Unauthorized,
            Self::Decode(_) => ErrorKind::InvalidInput,
            Self::Domain(_) | Self::Repository(_) => ErrorKind::Internal,
        }
    }
}

/// Applies verified payment confirmations to tasks.
#[derive(Clone)]
pub struct EscrowWebhookService<R, E, H, C>
where
    R: TaskRepository + OfferRepository,
    E: EscrowGateway,
    H: ChatGateway,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    escrow: Arc<E>,
    chat: Arc<H>,
    clock: Arc<C>,
    verifier: WebhookVerifier,
    chat_window: Duration,
}

impl<R, E, H, C> EscrowWebhookService<R, E, H, C>
where
    R: TaskRepository + OfferRepository,
    E: EscrowGateway,
    H: ChatGateway,
    C: Clock + Send + Sync,
{
    /// Creates a new webhook service.
    #[must_use]
    pub const fn new(
        repository: Arc<R>,
        escrow: Arc<E>,
        chat: Arc<H>,
        clock: Arc<C>,
        verifier: WebhookVerifier,
        chat_window: Duration,
    ) -> Self {
        Self {
            repository,
            escrow,
            chat,
            clock,
            verifier,
            chat_window,
        }
    }

    /// Verifies, decodes, and applies one delivery.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::Signature`] before the body is read when the
    /// signature does not verify, [`WebhookError::Decode`] for a malformed
    /// body, and [`WebhookError::Repository`] when storage fails. Callers
    /// should answer these with a failure so the gateway redelivers.
    pub async fn handle(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookOutcome, WebhookError> {
        if let Err(err) = self
            .verifier
            .verify(payload, signature_header, self.clock.utc())
        {
            tracing::warn!(error = %err, "rejected webhook with invalid signature");
            return Err(err.into());
        }

        let outcome = match EscrowEvent::decode(payload)? {
            EscrowEvent::Other {
                event_id,
                event_type,
            } => {
                tracing::debug!(event_id = %event_id, event_type = %event_type, "ignoring webhook event");
                WebhookOutcome::Ignored
            }
            EscrowEvent::CheckoutCompleted { event_id, checkout } => {
                tracing::info!(
                    event_id = %event_id,
                    session_id = %checkout.id,
                    task_id = %checkout.metadata.task_id,
                    "checkout completed"
                );
                self.apply_checkout(&checkout).await?
            }
        };
        tracing::info!(outcome = %outcome, "webhook handled");
        Ok(outcome)
    }

    async fn apply_checkout(
        &self,
        checkout: &CompletedCheckout,
    ) -> Result<WebhookOutcome, WebhookError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let Some(mut task) = self
                .repository
                .find_by_checkout_session(&checkout.id)
                .await?
            else {
                return self.refund_superseded(checkout).await;
            };
            if !metadata_matches(&task, checkout) {
                tracing::warn!(
                    task_id = %task.id(),
                    session_id = %checkout.id,
                    metadata_task_id = %checkout.metadata.task_id,
                    metadata_helper_id = %checkout.metadata.helper_id,
                    "checkout metadata does not match task"
                );
                return Ok(WebhookOutcome::MetadataMismatch);
            }

            match task.status() {
                TaskStatus::Requested => {
                    let Some(offer_id) = task.checkout().map(|link| link.offer_id) else {
                        return Ok(WebhookOutcome::UnknownSession);
                    };
                    let expected = task.version();
                    task.confirm_funding(
                        &checkout.id,
                        checkout.payment_intent.clone(),
                        &*self.clock,
                    )?;
                    match self
                        .repository
                        .accept_funding(&task, expected, offer_id)
                        .await
                    {
                        Ok(()) => {}
                        Err(TaskRepositoryError::VersionConflict { .. })
                            if attempt < MAX_ATTEMPTS =>
                        {
                            tracing::warn!(
                                task_id = %task.id(),
                                session_id = %checkout.id,
                                "funding lost a concurrent update; re-evaluating"
                            );
                            continue;
                        }
                        Err(err) => return Err(err.into()),
                    }
                    tracing::info!(
                        task_id = %task.id(),
                        offer_id = %offer_id,
                        payment_id = %checkout.payment_intent,
                        "task funded and helper bound"
                    );
                    self.open_chat(&task).await;
                    return Ok(WebhookOutcome::Accepted);
                }
                TaskStatus::Canceled => {
                    if task.refund().is_some() {
                        return Ok(WebhookOutcome::AlreadyProcessed);
                    }
                    let expected = task.version();
                    let record = task.record_late_payment_refund(
                        &checkout.id,
                        checkout.payment_intent.clone(),
                        &*self.clock,
                    )?;
                    match self.repository.update(&task, expected).await {
                        Ok(()) => {}
                        Err(TaskRepositoryError::VersionConflict { .. })
                            if attempt < MAX_ATTEMPTS =>
                        {
                            continue;
                        }
                        Err(err) => return Err(err.into()),
                    }
                    tracing::warn!(
                        task_id = %task.id(),
                        payment_id = %record.payment_id,
                        amount = %record.amount,
                        "payment arrived after cancellation; refunding"
                    );
                    refund_quietly(&*self.escrow, task.id(), &record).await;
                    return Ok(WebhookOutcome::RefundedLatePayment);
                }
                _ => {
                    self.open_chat(&task).await;
                    return Ok(WebhookOutcome::AlreadyProcessed);
                }
            }
        }
    }

    /// Refunds a payment captured on a session that is no longer any task's
    /// current checkout. The correlated task itself is left untouched.
    async fn refund_superseded(
        &self,
        checkout: &CompletedCheckout,
    ) -> Result<WebhookOutcome, WebhookError> {
        let metadata = &checkout.metadata;
        let Some(task) = self.repository.find_by_id(metadata.task_id).await? else {
            tracing::warn!(
                session_id = %checkout.id,
                metadata_task_id = %metadata.task_id,
                "no task references checkout session"
            );
            return Ok(WebhookOutcome::UnknownSession);
        };
        if &metadata.poster_id != task.poster_id() {
            tracing::warn!(
                task_id = %task.id(),
                session_id = %checkout.id,
                metadata_poster_id = %metadata.poster_id,
                "checkout metadata does not match task"
            );
            return Ok(WebhookOutcome::MetadataMismatch);
        }
        if holds_payment(&task, checkout) {
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        let record = RefundRecord {
            payment_id: checkout.payment_intent.clone(),
            amount: task.price(),
            requested_at: self.clock.utc(),
        };
        tracing::warn!(
            task_id = %task.id(),
            session_id = %checkout.id,
            payment_id = %record.payment_id,
            amount = %record.amount,
            "payment completed on a superseded checkout; refunding"
        );
        refund_quietly(&*self.escrow, task.id(), &record).await;
        Ok(WebhookOutcome::RefundedSupersededPayment)
    }

    /// Opens the poster/helper thread, logging failures so a redelivery can
    /// try again.
    async fn open_chat(&self, task: &Task) {
        let Some(helper_id) = task.helper_id() else {
            return;
        };
        let thread = ChatThread::open(
            task.id(),
            task.poster_id().clone(),
            helper_id.clone(),
            self.chat_window,
            &*self.clock,
        );
        if let Err(err) = self.chat.open_thread(&thread).await {
            tracing::error!(task_id = %task.id(), error = %err, "failed to open chat thread");
        }
    }
}

fn metadata_matches(task: &Task, checkout: &CompletedCheckout) -> bool {
    let metadata = &checkout.metadata;
    let Some(link) = task.checkout() else {
        return false;
    };
    metadata.task_id == task.id()
        && &metadata.poster_id == task.poster_id()
        && metadata.helper_id == link.helper_id
        && metadata.offer_id.is_none_or(|offer_id| offer_id == link.offer_id)
}

fn holds_payment(task: &Task, checkout: &CompletedCheckout) -> bool {
    let payment_id = &checkout.payment_intent;
    task.assignment()
        .is_some_and(|assignment| assignment.payment_id() == payment_id)
        || task
            .refund()
            .is_some_and(|record| &record.payment_id == payment_id)
}
