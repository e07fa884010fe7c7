//! Shared world state for marketplace lifecycle BDD scenarios.

use std::{collections::HashMap, sync::Arc};

use chrono::{Duration, Utc};
use errand::{
    chat::adapters::memory::InMemoryChatStore,
    config::MarketplaceConfig,
    escrow::{
        adapters::memory::InMemoryEscrowGateway,
        domain::{CheckoutSessionId, WebhookVerifier},
    },
    identity::{adapters::memory::InMemoryPayoutDirectory, domain::Caller},
    task::{
        adapters::memory::InMemoryTaskRepository,
        domain::{Offer, Task},
        services::{
            EscrowWebhookService, TaskLifecycleError, TaskLifecycleService, WebhookError,
            WebhookOutcome,
        },
    },
};
use mockable::DefaultClock;
use rstest::fixture;

/// Lifecycle service type used by the BDD world.
pub type WorldService = TaskLifecycleService<
    InMemoryTaskRepository,
    InMemoryEscrowGateway,
    InMemoryChatStore,
    InMemoryPayoutDirectory,
    DefaultClock,
>;

/// Webhook service type used by the BDD world.
pub type WorldWebhooks = EscrowWebhookService<
    InMemoryTaskRepository,
    InMemoryEscrowGateway,
    InMemoryChatStore,
    DefaultClock,
>;

/// Scenario world for marketplace behaviour tests.
pub struct MarketplaceWorld {
    pub service: WorldService,
    pub webhooks: WorldWebhooks,
    pub repository: Arc<InMemoryTaskRepository>,
    pub escrow: Arc<InMemoryEscrowGateway>,
    pub chat: Arc<InMemoryChatStore>,
    pub payouts: Arc<InMemoryPayoutDirectory>,
    pub verifier: WebhookVerifier,
    pub poster: Option<Caller>,
    pub helpers: HashMap<String, Caller>,
    pub offers: HashMap<String, Offer>,
    pub task: Option<Task>,
    pub session_id: Option<CheckoutSessionId>,
    pub last_delivery: Option<(Vec<u8>, String)>,
    pub last_post: Option<Result<Task, TaskLifecycleError>>,
    pub last_cancel: Option<Result<Task, TaskLifecycleError>>,
    pub last_outcome: Option<Result<WebhookOutcome, WebhookError>>,
}

impl MarketplaceWorld {
    /// Creates a world over fresh in-memory adapters with default settings.
    #[must_use]
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryTaskRepository::new());
        let escrow = Arc::new(InMemoryEscrowGateway::new());
        let chat = Arc::new(InMemoryChatStore::new());
        let payouts = Arc::new(InMemoryPayoutDirectory::new());
        let clock = Arc::new(DefaultClock);
        let config = MarketplaceConfig::default();
        let verifier = WebhookVerifier::new("whsec_bdd", Duration::minutes(5))
            .expect("static secret is valid");

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

        Self {
            service,
            webhooks,
            repository,
            escrow,
            chat,
            payouts,
            verifier,
            poster: None,
            helpers: HashMap::new(),
            offers: HashMap::new(),
            task: None,
            session_id: None,
            last_delivery: None,
            last_post: None,
            last_cancel: None,
            last_outcome: None,
        }
    }

    /// Returns the scenario poster.
    ///
    /// # Errors
    ///
    /// Returns an error if no poster step ran.
    pub fn poster(&self) -> eyre::Result<&Caller> {
        self.poster
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing poster in scenario world"))
    }

    /// Returns the scenario task.
    ///
    /// # Errors
    ///
    /// Returns an error if no task was posted.
    pub fn task(&self) -> eyre::Result<&Task> {
        self.task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }

    /// Signs a completion event for the chosen session.
    ///
    /// # Errors
    ///
    /// Returns an error if no checkout is open or signing fails.
    pub fn signed_completion(&self, payment: &str) -> eyre::Result<(Vec<u8>, String)> {
        let session_id = self
            .session_id
            .as_ref()
            .ok_or_else(|| eyre::eyre!("no checkout session in scenario world"))?;
        let envelope = self.escrow.completion_event(
            session_id,
            errand::escrow::domain::PaymentConfirmationId::new(payment)?,
        )?;
        let payload = serde_json::to_vec(&envelope)?;
        let header = self.verifier.sign(&payload, Utc::now())?;
        Ok((payload, header))
    }
}

impl Default for MarketplaceWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> MarketplaceWorld {
    MarketplaceWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
