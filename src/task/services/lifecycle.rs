//! Lifecycle service: posting, offers, helper selection, and reads.

use super::{
    CheckoutRedirect, CreateTaskRequest, SubmitOfferRequest, TaskLifecycleError,
    TaskLifecycleResult,
};
use crate::{
    chat::ports::ChatGateway,
    config::MarketplaceConfig,
    escrow::{
        domain::{CheckoutRequest, CheckoutSessionId, CorrelationMetadata},
        ports::EscrowGateway,
    },
    identity::{domain::Caller, ports::PayoutDirectory},
    task::{
        domain::{CheckoutLink, Offer, OfferId, Task, TaskAction, TaskId, TaskView},
        ports::{OfferRepository, TaskFilter, TaskRepository},
    },
};
use mockable::Clock;
use std::sync::Arc;

/// Orchestrates every caller-initiated task command.
///
/// Each mutation reads the task, applies a domain transition, and writes it
/// back with a compare-and-set on the version it read. Gateway calls that
/// follow a committed transition are best effort: failures are logged and
/// never undo the transition.
#[derive(Clone)]
pub struct TaskLifecycleService<R, E, H, P, C>
where
    R: TaskRepository + OfferRepository,
    E: EscrowGateway,
    H: ChatGateway,
    P: PayoutDirectory,
    C: Clock + Send + Sync,
{
    pub(super) repository: Arc<R>,
    pub(super) escrow: Arc<E>,
    pub(super) chat: Arc<H>,
    pub(super) payouts: Arc<P>,
    pub(super) clock: Arc<C>,
    pub(super) config: MarketplaceConfig,
}

impl<R, E, H, P, C> TaskLifecycleService<R, E, H, P, C>
where
    R: TaskRepository + OfferRepository,
    E: EscrowGateway,
    H: ChatGateway,
    P: PayoutDirectory,
    C: Clock + Send + Sync,
{
    /// Creates a new lifecycle service.
    #[must_use]
    pub const fn new(
        repository: Arc<R>,
        escrow: Arc<E>,
        chat: Arc<H>,
        payouts: Arc<P>,
        clock: Arc<C>,
        config: MarketplaceConfig,
    ) -> Self {
        Self {
            repository,
            escrow,
            chat,
            payouts,
            clock,
            config,
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &MarketplaceConfig {
        &self.config
    }

    /// Posts a new task on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] for an unknown category, blank
    /// text, or a price below the configured minimum, and
    /// [`TaskLifecycleError::Repository`] when storage fails.
    pub async fn create_task(
        &self,
        caller: &Caller,
        request: CreateTaskRequest,
    ) -> TaskLifecycleResult<Task> {
        let (details, price) = request.into_details()?;
        let task = Task::post(
            details,
            price,
            self.config.minimum_price,
            caller,
            &*self.clock,
        )?;
        self.repository.store(&task).await?;
        tracing::info!(
            task_id = %task.id(),
            poster_id = %caller.user_id(),
            price = %task.price(),
            "task posted"
        );
        Ok(task)
    }

    /// Records a helper's offer on a requested task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`],
    /// [`TaskLifecycleError::Forbidden`] when the poster offers on their own
    /// task, or an invalid-state error once the task has left `requested`.
    pub async fn submit_offer(
        &self,
        caller: &Caller,
        request: SubmitOfferRequest,
    ) -> TaskLifecycleResult<Offer> {
        let task = self.load_task(request.task_id).await?;
        if task.is_poster(caller.user_id()) {
            return Err(forbidden(caller, TaskAction::SubmitOffer));
        }
        let offer = Offer::submit(
            &task,
            caller,
            &request.note,
            request.proposed_price,
            &*self.clock,
        )?;
        self.repository.store_offer(&offer).await?;
        tracing::info!(
            task_id = %task.id(),
            offer_id = %offer.id(),
            helper_id = %caller.user_id(),
            "offer submitted"
        );
        Ok(offer)
    }

    /// Chooses an offer and opens an escrow checkout for the task price.
    ///
    /// The task stays `requested` until the gateway confirms payment. Choosing
    /// again replaces the pending checkout and expires the old session.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Forbidden`] for non-posters,
    /// [`TaskLifecycleError::OfferNotFound`] for offers of other tasks,
    /// [`TaskLifecycleError::HelperNotPayoutReady`] when the helper cannot
    /// be paid, and [`TaskLifecycleError::Escrow`] when checkout creation
    /// fails. A lost compare-and-set race surfaces as a repository
    /// version conflict after the fresh session has been expired.
    pub async fn choose_helper(
        &self,
        caller: &Caller,
        task_id: TaskId,
        offer_id: OfferId,
    ) -> TaskLifecycleResult<CheckoutRedirect> {
        let mut task = self.load_task(task_id).await?;
        if !task.is_poster(caller.user_id()) {
            return Err(forbidden(caller, TaskAction::ChooseHelper));
        }
        task.ensure_requested(TaskAction::ChooseHelper)?;

        let offer = self
            .repository
            .find_offer(offer_id)
            .await?
            .filter(|found| found.task_id() == task_id)
            .ok_or(TaskLifecycleError::OfferNotFound(offer_id))?;
        offer.ensure_pending()?;

        let destination = self
            .payouts
            .payout_profile(offer.helper_id())
            .await?
            .as_ref()
            .and_then(|profile| profile.payout_destination().cloned())
            .ok_or_else(|| TaskLifecycleError::HelperNotPayoutReady(offer.helper_id().clone()))?;
        let split = self.config.platform_fee.split(task.price())?;

        let request = CheckoutRequest {
            title: task.details().title.clone(),
            description: task.details().description.clone(),
            total: split.total(),
            platform_fee: split.platform_fee(),
            destination: destination.clone(),
            metadata: CorrelationMetadata {
                task_id,
                poster_id: task.poster_id().clone(),
                helper_id: offer.helper_id().clone(),
                offer_id: Some(offer_id),
            },
            redirects: self.config.checkout_redirects(task_id),
        };
        let session = self.escrow.create_checkout(&request).await?;

        let link = CheckoutLink {
            session_id: session.id.clone(),
            offer_id,
            helper_id: offer.helper_id().clone(),
            helper_name: offer.helper_name().to_owned(),
            payout_account: destination,
            split,
            selected_at: self.clock.utc(),
        };
        let expected = task.version();
        let superseded = task.attach_checkout(link, &*self.clock)?;
        if let Err(err) = self.repository.update(&task, expected).await {
            tracing::warn!(
                task_id = %task_id,
                session_id = %session.id,
                error = %err,
                "helper selection lost a concurrent update; expiring fresh checkout"
            );
            self.expire_checkout_quietly(task_id, &session.id).await;
            return Err(err.into());
        }

        if let Some(previous) = superseded {
            self.expire_checkout_quietly(task_id, &previous.session_id)
                .await;
        }
        tracing::info!(
            task_id = %task_id,
            offer_id = %offer_id,
            session_id = %session.id,
            total = %split.total(),
            platform_fee = %split.platform_fee(),
            "checkout opened for chosen helper"
        );
        Ok(CheckoutRedirect {
            session_id: session.id,
            redirect_url: session.redirect_url,
        })
    }

    /// Returns one task as seen by `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] for unknown tasks.
    pub async fn get_task(&self, caller: &Caller, task_id: TaskId) -> TaskLifecycleResult<TaskView> {
        let task = self.load_task(task_id).await?;
        Ok(TaskView::for_caller(&task, caller))
    }

    /// Browses tasks matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the lookup fails.
    pub async fn list_tasks(
        &self,
        caller: &Caller,
        filter: &TaskFilter,
    ) -> TaskLifecycleResult<Vec<TaskView>> {
        let tasks = self.repository.list(filter).await?;
        Ok(project(&tasks, caller))
    }

    /// Returns the tasks `caller` has posted.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the lookup fails.
    pub async fn list_posted(&self, caller: &Caller) -> TaskLifecycleResult<Vec<TaskView>> {
        let tasks = self.repository.list_by_poster(caller.user_id()).await?;
        Ok(project(&tasks, caller))
    }

    /// Returns the tasks `caller` is the bound helper of.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the lookup fails.
    pub async fn list_assigned(&self, caller: &Caller) -> TaskLifecycleResult<Vec<TaskView>> {
        let tasks = self.repository.list_by_helper(caller.user_id()).await?;
        Ok(project(&tasks, caller))
    }

    /// Lists a task's offers. The poster and admins see every offer; anyone
    /// else sees only their own.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] for unknown tasks.
    pub async fn list_offers(
        &self,
        caller: &Caller,
        task_id: TaskId,
    ) -> TaskLifecycleResult<Vec<Offer>> {
        let task = self.load_task(task_id).await?;
        let offers = self.repository.list_offers(task_id).await?;
        if caller.is_admin() || task.is_poster(caller.user_id()) {
            return Ok(offers);
        }
        Ok(offers
            .into_iter()
            .filter(|offer| offer.helper_id() == caller.user_id())
            .collect())
    }

    pub(super) async fn load_task(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.repository
            .find_by_id(task_id)
            .await?
            .ok_or(TaskLifecycleError::TaskNotFound(task_id))
    }

    pub(super) async fn expire_checkout_quietly(
        &self,
        task_id: TaskId,
        session_id: &CheckoutSessionId,
    ) {
        if let Err(err) = self.escrow.expire_checkout(session_id).await {
            tracing::error!(
                task_id = %task_id,
                session_id = %session_id,
                error = %err,
                "failed to expire checkout session"
            );
        }
    }
}

pub(super) fn forbidden(caller: &Caller, action: TaskAction) -> TaskLifecycleError {
    TaskLifecycleError::Forbidden {
        user_id: caller.user_id().clone(),
        action,
    }
}

fn project(tasks: &[Task], caller: &Caller) -> Vec<TaskView> {
    tasks
        .iter()
        .map(|task| TaskView::for_caller(task, caller))
        .collect()
}
