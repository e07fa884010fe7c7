//! Shared wiring for in-memory integration tests.

use std::sync::Arc;

use chrono::Utc;
use errand::{
    chat::adapters::memory::InMemoryChatStore,
    config::{MarketplaceConfig, WebhookConfig},
    escrow::{
        adapters::memory::InMemoryEscrowGateway,
        domain::{CheckoutSessionId, PaymentConfirmationId, WebhookVerifier},
    },
    identity::{
        adapters::memory::InMemoryPayoutDirectory,
        domain::{Caller, PayoutAccountId, PayoutProfile, UserId},
    },
    task::{
        adapters::memory::InMemoryTaskRepository,
        domain::{Offer, Task},
        ports::TaskRepository,
        services::{
            CreateTaskRequest, EscrowWebhookService, SubmitOfferRequest, TaskLifecycleService,
            WebhookError, WebhookOutcome,
        },
    },
};
use eyre::WrapErr;
use mockable::DefaultClock;
use rstest::fixture;
use rust_decimal::Decimal;

/// Lifecycle service over in-memory adapters.
pub type Service = TaskLifecycleService<
    InMemoryTaskRepository,
    InMemoryEscrowGateway,
    InMemoryChatStore,
    InMemoryPayoutDirectory,
    DefaultClock,
>;

/// Webhook service over in-memory adapters.
pub type Webhooks = EscrowWebhookService<
    InMemoryTaskRepository,
    InMemoryEscrowGateway,
    InMemoryChatStore,
    DefaultClock,
>;

/// Engine wired from configuration, as a host process would.
pub struct Marketplace {
    pub service: Service,
    pub webhooks: Webhooks,
    pub repository: Arc<InMemoryTaskRepository>,
    pub escrow: Arc<InMemoryEscrowGateway>,
    pub chat: Arc<InMemoryChatStore>,
    pub payouts: Arc<InMemoryPayoutDirectory>,
    verifier: WebhookVerifier,
}

impl Marketplace {
    /// Builds the engine from key/value settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings do not parse.
    pub fn from_settings(pairs: &[(&str, &str)]) -> eyre::Result<Self> {
        let lookup = |key: &str| {
            pairs
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value).to_owned())
        };
        let config = MarketplaceConfig::from_lookup(lookup).wrap_err("marketplace config")?;
        let webhook_config = WebhookConfig::from_lookup(lookup).wrap_err("webhook config")?;
        let verifier = webhook_config.verifier().wrap_err("webhook verifier")?;

        let repository = Arc::new(InMemoryTaskRepository::new());
        let escrow = Arc::new(InMemoryEscrowGateway::new());
        let chat = Arc::new(InMemoryChatStore::new());
        let payouts = Arc::new(InMemoryPayoutDirectory::new());
        let clock = Arc::new(DefaultClock);

        let webhooks = EscrowWebhookService::new(
            Arc::clone(&repository),
            Arc::clone(&escrow),
            Arc::clone(&chat),
            Arc::clone(&clock),
            verifier.clone(),
            config.chat_window,
        );
        let service = TaskLifecycleService::new(
            Arc::clone(&repository),
            Arc::clone(&escrow),
            Arc::clone(&chat),
            Arc::clone(&payouts),
            clock,
            config,
        );
        Ok(Self {
            service,
            webhooks,
            repository,
            escrow,
            chat,
            payouts,
            verifier,
        })
    }

    /// Registers a payout-ready helper.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifiers are invalid.
    pub fn helper(&self, name: &str) -> eyre::Result<Caller> {
        let caller = member(name)?;
        let account = PayoutAccountId::new(format!("acct_{name}"))?;
        self.payouts
            .register(caller.user_id().clone(), PayoutProfile::new(account, true))?;
        Ok(caller)
    }

    /// Posts a standard task at `cents`.
    ///
    /// # Errors
    ///
    /// Returns an error if posting fails.
    pub async fn post(&self, poster: &Caller, cents: i64) -> eyre::Result<Task> {
        Ok(self
            .service
            .create_task(poster, task_request(Decimal::new(cents, 2)))
            .await?)
    }

    /// Submits an offer from `helper`.
    ///
    /// # Errors
    ///
    /// Returns an error if the offer is rejected.
    pub async fn offer(&self, helper: &Caller, task: &Task) -> eyre::Result<Offer> {
        Ok(self
            .service
            .submit_offer(helper, SubmitOfferRequest::new(task.id(), "Available now"))
            .await?)
    }

    /// Chooses `offer` and returns the checkout session.
    ///
    /// # Errors
    ///
    /// Returns an error if selection fails.
    pub async fn choose(&self, poster: &Caller, offer: &Offer) -> eyre::Result<CheckoutSessionId> {
        Ok(self
            .service
            .choose_helper(poster, offer.task_id(), offer.id())
            .await?
            .session_id)
    }

    /// Delivers a signed completion webhook for `session_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be built or signed.
    pub async fn pay(
        &self,
        session_id: &CheckoutSessionId,
        payment: &str,
    ) -> eyre::Result<Result<WebhookOutcome, WebhookError>> {
        let envelope = self
            .escrow
            .completion_event(session_id, PaymentConfirmationId::new(payment)?)?;
        let payload = serde_json::to_vec(&envelope)?;
        let header = self.verifier.sign(&payload, Utc::now())?;
        Ok(self.webhooks.handle(&payload, &header).await)
    }

    /// Reads the stored task.
    ///
    /// # Errors
    ///
    /// Returns an error if the task is missing.
    pub async fn stored(&self, task: &Task) -> eyre::Result<Task> {
        self.repository
            .find_by_id(task.id())
            .await?
            .ok_or_else(|| eyre::eyre!("task {} missing", task.id()))
    }
}

/// Builds an engine with default business settings.
///
/// # Errors
///
/// Returns an error if the settings do not load.
pub fn default_marketplace() -> eyre::Result<Marketplace> {
    Marketplace::from_settings(&[("ESCROW_WEBHOOK_SECRET", "whsec_integration")])
}

/// Provides an engine with default business settings.
#[fixture]
pub fn marketplace() -> Marketplace {
    default_marketplace().expect("default settings should load")
}

/// Builds a member caller.
///
/// # Errors
///
/// Returns an error for blank names.
pub fn member(name: &str) -> eyre::Result<Caller> {
    Ok(Caller::member(UserId::new(name)?, name))
}

/// Builds a standard task request.
#[must_use]
pub fn task_request(price: Decimal) -> CreateTaskRequest {
    CreateTaskRequest {
        title: "Deep clean kitchen".to_owned(),
        description: "Oven and fridge included".to_owned(),
        category: "cleaning".to_owned(),
        zip_code: "60614".to_owned(),
        area_description: "Lincoln Park".to_owned(),
        full_address: "2001 N Clark St".to_owned(),
        price,
        photo_required: false,
    }
}
