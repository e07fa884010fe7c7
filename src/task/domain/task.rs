//! Task aggregate root and its lifecycle state.

use super::{
    CancelingParty, ConfirmationCode, EscrowSplit, Money, OfferId, PaymentStatus, TaskAction,
    TaskCategory, TaskDomainError, TaskId, TaskStatus, TaskVersion,
};
use crate::{
    escrow::domain::{CheckoutSessionId, PaymentConfirmationId},
    identity::domain::{Caller, PayoutAccountId, UserId},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Poster-supplied description of the work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDetails {
    /// Short headline.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Kind of work.
    pub category: TaskCategory,
    /// Postal code used for discovery.
    pub zip_code: String,
    /// Coarse location shown to everyone.
    pub area_description: String,
    /// Street address shown only to the poster, helper, and admins.
    pub full_address: String,
    /// Whether completion needs a proof photo in chat.
    pub photo_required: bool,
}

impl TaskDetails {
    /// Trims every text field and rejects empty ones.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyField`] naming the first empty field.
    pub fn validated(self) -> Result<Self, TaskDomainError> {
        Ok(Self {
            title: required("title", &self.title)?,
            description: required("description", &self.description)?,
            category: self.category,
            zip_code: required("zip_code", &self.zip_code)?,
            area_description: required("area_description", &self.area_description)?,
            full_address: required("full_address", &self.full_address)?,
            photo_required: self.photo_required,
        })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, TaskDomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TaskDomainError::EmptyField(field));
    }
    Ok(trimmed.to_owned())
}

/// Escrow session opened when the poster chose a helper.
///
/// Replaced only while the task is still requested; retained afterwards so
/// late or repeated confirmations can be correlated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutLink {
    /// Gateway session identifier.
    pub session_id: CheckoutSessionId,
    /// Offer the poster chose.
    pub offer_id: OfferId,
    /// Helper who made the offer.
    pub helper_id: UserId,
    /// Helper display name at selection time.
    pub helper_name: String,
    /// Helper's connected payout account.
    pub payout_account: PayoutAccountId,
    /// Fee split computed at selection time.
    pub split: EscrowSplit,
    /// When the poster chose the helper.
    pub selected_at: DateTime<Utc>,
}

/// Helper binding created when escrow funding is confirmed.
///
/// Only [`Task::confirm_funding`] builds one, so a requested task can never
/// carry assignment fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    helper_id: UserId,
    helper_name: String,
    offer_id: OfferId,
    session_id: CheckoutSessionId,
    payment_id: PaymentConfirmationId,
    payout_account: PayoutAccountId,
    split: EscrowSplit,
    accepted_at: DateTime<Utc>,
}

impl Assignment {
    fn from_checkout(
        link: &CheckoutLink,
        payment_id: PaymentConfirmationId,
        accepted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            helper_id: link.helper_id.clone(),
            helper_name: link.helper_name.clone(),
            offer_id: link.offer_id,
            session_id: link.session_id.clone(),
            payment_id,
            payout_account: link.payout_account.clone(),
            split: link.split,
            accepted_at,
        }
    }

    /// Returns the bound helper.
    #[must_use]
    pub const fn helper_id(&self) -> &UserId {
        &self.helper_id
    }

    /// Returns the helper display name.
    #[must_use]
    pub fn helper_name(&self) -> &str {
        &self.helper_name
    }

    /// Returns the accepted offer.
    #[must_use]
    pub const fn offer_id(&self) -> OfferId {
        self.offer_id
    }

    /// Returns the funded checkout session.
    #[must_use]
    pub const fn session_id(&self) -> &CheckoutSessionId {
        &self.session_id
    }

    /// Returns the captured payment.
    #[must_use]
    pub const fn payment_id(&self) -> &PaymentConfirmationId {
        &self.payment_id
    }

    /// Returns the payout destination.
    #[must_use]
    pub const fn payout_account(&self) -> &PayoutAccountId {
        &self.payout_account
    }

    /// Returns the escrow split.
    #[must_use]
    pub const fn split(&self) -> EscrowSplit {
        self.split
    }

    /// Returns when funding was confirmed.
    #[must_use]
    pub const fn accepted_at(&self) -> DateTime<Utc> {
        self.accepted_at
    }
}

/// Refund requested for a captured payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRecord {
    /// Payment being refunded.
    pub payment_id: PaymentConfirmationId,
    /// Amount returned to the poster.
    pub amount: Money,
    /// When the refund was requested.
    pub requested_at: DateTime<Utc>,
}

/// Task lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskState {
    /// Open for offers.
    Requested,
    /// Funded and bound to a helper.
    Accepted {
        /// Helper binding.
        assignment: Assignment,
    },
    /// The helper has started work.
    InProgress {
        /// Helper binding.
        assignment: Assignment,
        /// When work started.
        started_at: DateTime<Utc>,
    },
    /// Work has been marked done.
    Completed {
        /// Helper binding.
        assignment: Assignment,
        /// When work started, if it was recorded.
        started_at: Option<DateTime<Utc>>,
        /// When the task was completed.
        completed_at: DateTime<Utc>,
    },
    /// Completion is contested.
    Disputed {
        /// Helper binding.
        assignment: Assignment,
        /// When work started, if it was recorded.
        started_at: Option<DateTime<Utc>>,
        /// When the task was completed.
        completed_at: DateTime<Utc>,
        /// When the dispute was raised.
        disputed_at: DateTime<Utc>,
    },
    /// Withdrawn before completion.
    Canceled {
        /// When the task was canceled.
        canceled_at: DateTime<Utc>,
        /// Party that canceled.
        canceled_by: CancelingParty,
        /// Binding that existed when a funded task was canceled.
        prior_assignment: Option<Assignment>,
        /// Refund requested for captured funds.
        refund: Option<RefundRecord>,
    },
}

impl TaskState {
    /// Returns the flat status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        match self {
            Self::Requested => TaskStatus::Requested,
            Self::Accepted { .. } => TaskStatus::Accepted,
            Self::InProgress { .. } => TaskStatus::InProgress,
            Self::Completed { .. } => TaskStatus::Completed,
            Self::Disputed { .. } => TaskStatus::Disputed,
            Self::Canceled { .. } => TaskStatus::Canceled,
        }
    }

    /// Returns the active helper binding.
    ///
    /// `None` for requested and canceled tasks.
    #[must_use]
    pub const fn assignment(&self) -> Option<&Assignment> {
        match self {
            Self::Accepted { assignment }
            | Self::InProgress { assignment, .. }
            | Self::Completed { assignment, .. }
            | Self::Disputed { assignment, .. } => Some(assignment),
            Self::Requested | Self::Canceled { .. } => None,
        }
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    poster_id: UserId,
    poster_name: String,
    details: TaskDetails,
    price: Money,
    confirmation_code: ConfirmationCode,
    checkout: Option<CheckoutLink>,
    state: TaskState,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: TaskVersion,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted poster.
    pub poster_id: UserId,
    /// Persisted poster display name.
    pub poster_name: String,
    /// Persisted task content.
    pub details: TaskDetails,
    /// Persisted price.
    pub price: Money,
    /// Persisted confirmation code.
    pub confirmation_code: ConfirmationCode,
    /// Persisted checkout link, if any.
    pub checkout: Option<CheckoutLink>,
    /// Persisted lifecycle state.
    pub state: TaskState,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
    /// Persisted version.
    pub version: TaskVersion,
}

impl Task {
    /// Posts a new task for `poster`.
    ///
    /// The minimum is compared against the price as entered, before it is
    /// rounded to cents.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::PriceBelowMinimum`] for prices under
    /// `minimum`, [`TaskDomainError::InvalidAmount`] for prices that do not
    /// convert to cents, or [`TaskDomainError::EmptyField`] for blank text.
    pub fn post(
        details: TaskDetails,
        price: Decimal,
        minimum: Money,
        poster: &Caller,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        if price < minimum.to_decimal() {
            return Err(TaskDomainError::PriceBelowMinimum {
                price: price.to_string(),
                minimum,
            });
        }
        let price_cents = Money::from_decimal(price)?;
        let validated = details.validated()?;
        let timestamp = clock.utc();

        Ok(Self {
            id: TaskId::new(),
            poster_id: poster.user_id().clone(),
            poster_name: poster.display_name().to_owned(),
            details: validated,
            price: price_cents,
            confirmation_code: ConfirmationCode::generate(),
            checkout: None,
            state: TaskState::Requested,
            created_at: timestamp,
            updated_at: timestamp,
            version: TaskVersion::INITIAL,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            poster_id: data.poster_id,
            poster_name: data.poster_name,
            details: data.details,
            price: data.price,
            confirmation_code: data.confirmation_code,
            checkout: data.checkout,
            state: data.state,
            created_at: data.created_at,
            updated_at: data.updated_at,
            version: data.version,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the poster.
    #[must_use]
    pub const fn poster_id(&self) -> &UserId {
        &self.poster_id
    }

    /// Returns the poster display name.
    #[must_use]
    pub fn poster_name(&self) -> &str {
        &self.poster_name
    }

    /// Returns the task content.
    #[must_use]
    pub const fn details(&self) -> &TaskDetails {
        &self.details
    }

    /// Returns the price charged at checkout.
    #[must_use]
    pub const fn price(&self) -> Money {
        self.price
    }

    /// Returns the confirmation code.
    #[must_use]
    pub const fn confirmation_code(&self) -> &ConfirmationCode {
        &self.confirmation_code
    }

    /// Returns the current or last checkout link.
    #[must_use]
    pub const fn checkout(&self) -> Option<&CheckoutLink> {
        self.checkout.as_ref()
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> &TaskState {
        &self.state
    }

    /// Returns the flat lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.state.status()
    }

    /// Returns the payment position derived from the state.
    #[must_use]
    pub const fn payment_status(&self) -> PaymentStatus {
        match &self.state {
            TaskState::Requested => PaymentStatus::Pending,
            TaskState::Canceled {
                refund: Some(_), ..
            } => PaymentStatus::Refunded,
            TaskState::Canceled { refund: None, .. } => PaymentStatus::Pending,
            TaskState::Accepted { .. }
            | TaskState::InProgress { .. }
            | TaskState::Completed { .. }
            | TaskState::Disputed { .. } => PaymentStatus::Paid,
        }
    }

    /// Returns the active helper binding.
    #[must_use]
    pub const fn assignment(&self) -> Option<&Assignment> {
        self.state.assignment()
    }

    /// Returns the bound helper for accepted, in-progress, completed, and
    /// disputed tasks.
    #[must_use]
    pub fn helper_id(&self) -> Option<&UserId> {
        self.assignment().map(Assignment::helper_id)
    }

    /// Returns when funding was confirmed.
    #[must_use]
    pub fn accepted_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            TaskState::Canceled {
                prior_assignment, ..
            } => prior_assignment.as_ref().map(Assignment::accepted_at),
            state => state.assignment().map(Assignment::accepted_at),
        }
    }

    /// Returns when work started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            TaskState::InProgress { started_at, .. } => Some(*started_at),
            TaskState::Completed { started_at, .. } | TaskState::Disputed { started_at, .. } => {
                *started_at
            }
            TaskState::Requested | TaskState::Accepted { .. } | TaskState::Canceled { .. } => None,
        }
    }

    /// Returns when the task was completed.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            TaskState::Completed { completed_at, .. } | TaskState::Disputed { completed_at, .. } => {
                Some(*completed_at)
            }
            _ => None,
        }
    }

    /// Returns when the dispute was raised.
    #[must_use]
    pub const fn disputed_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            TaskState::Disputed { disputed_at, .. } => Some(*disputed_at),
            _ => None,
        }
    }

    /// Returns when the task was canceled.
    #[must_use]
    pub const fn canceled_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            TaskState::Canceled { canceled_at, .. } => Some(*canceled_at),
            _ => None,
        }
    }

    /// Returns who canceled the task.
    #[must_use]
    pub const fn canceled_by(&self) -> Option<CancelingParty> {
        match &self.state {
            TaskState::Canceled { canceled_by, .. } => Some(*canceled_by),
            _ => None,
        }
    }

    /// Returns the refund recorded on a canceled task.
    #[must_use]
    pub const fn refund(&self) -> Option<&RefundRecord> {
        match &self.state {
            TaskState::Canceled { refund, .. } => refund.as_ref(),
            _ => None,
        }
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the concurrency version.
    #[must_use]
    pub const fn version(&self) -> TaskVersion {
        self.version
    }

    /// Returns `true` when `user_id` posted the task.
    #[must_use]
    pub fn is_poster(&self, user_id: &UserId) -> bool {
        &self.poster_id == user_id
    }

    /// Returns `true` when `user_id` is the bound helper.
    #[must_use]
    pub fn is_assigned_helper(&self, user_id: &UserId) -> bool {
        self.helper_id().is_some_and(|helper| helper == user_id)
    }

    /// Returns `true` when the caller may see the full address and
    /// confirmation code.
    #[must_use]
    pub fn can_view_private_details(&self, caller: &Caller) -> bool {
        caller.is_admin()
            || self.is_poster(caller.user_id())
            || self.is_assigned_helper(caller.user_id())
    }

    /// Fails unless the task is open for offers.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NotAcceptingOffers`] for any status other
    /// than requested.
    pub const fn ensure_accepting_offers(&self) -> Result<(), TaskDomainError> {
        match self.state {
            TaskState::Requested => Ok(()),
            _ => Err(TaskDomainError::NotAcceptingOffers {
                task_id: self.id,
                status: self.state.status(),
            }),
        }
    }

    /// Fails unless the task is still requested.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] naming `action`.
    pub const fn ensure_requested(&self, action: TaskAction) -> Result<(), TaskDomainError> {
        match self.state {
            TaskState::Requested => Ok(()),
            _ => Err(self.invalid_transition(action)),
        }
    }

    /// Records the checkout opened for a chosen helper.
    ///
    /// Returns the superseded link, if the poster had already chosen.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] unless the task is
    /// requested.
    pub fn attach_checkout(
        &mut self,
        link: CheckoutLink,
        clock: &impl Clock,
    ) -> Result<Option<CheckoutLink>, TaskDomainError> {
        self.require(TaskAction::ChooseHelper, |state| {
            matches!(state, TaskState::Requested)
        })?;
        let previous = self.checkout.replace(link);
        self.touch(clock);
        Ok(previous)
    }

    /// Binds the helper after the gateway confirmed payment for `session_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] unless the task is
    /// requested, or [`TaskDomainError::CheckoutMismatch`] when `session_id`
    /// is not the current checkout.
    pub fn confirm_funding(
        &mut self,
        session_id: &CheckoutSessionId,
        payment_id: PaymentConfirmationId,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.require(TaskAction::ConfirmFunding, |state| {
            matches!(state, TaskState::Requested)
        })?;
        let link = self.current_checkout(session_id)?;
        let assignment = Assignment::from_checkout(link, payment_id, clock.utc());
        self.state = TaskState::Accepted { assignment };
        self.touch(clock);
        Ok(())
    }

    /// Marks work as started.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] unless the task is
    /// accepted.
    pub fn start_work(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        let TaskState::Accepted { assignment } = &self.state else {
            return Err(self.invalid_transition(TaskAction::StartWork));
        };
        self.state = TaskState::InProgress {
            assignment: assignment.clone(),
            started_at: clock.utc(),
        };
        self.touch(clock);
        Ok(())
    }

    /// Marks the task done.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] unless the task is
    /// accepted or in progress.
    pub fn complete(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        let (assignment, started_at) = match &self.state {
            TaskState::Accepted { assignment } => (assignment.clone(), None),
            TaskState::InProgress {
                assignment,
                started_at,
            } => (assignment.clone(), Some(*started_at)),
            _ => return Err(self.invalid_transition(TaskAction::Complete)),
        };
        self.state = TaskState::Completed {
            assignment,
            started_at,
            completed_at: clock.utc(),
        };
        self.touch(clock);
        Ok(())
    }

    /// Withdraws the task.
    ///
    /// Canceling a funded task records a refund of the full captured amount
    /// and returns it so the caller can ask the gateway to pay it out.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] unless the task is
    /// requested or accepted.
    pub fn cancel(
        &mut self,
        canceled_by: CancelingParty,
        clock: &impl Clock,
    ) -> Result<Option<RefundRecord>, TaskDomainError> {
        let now = clock.utc();
        let prior_assignment = match &self.state {
            TaskState::Requested => None,
            TaskState::Accepted { assignment } => Some(assignment.clone()),
            _ => return Err(self.invalid_transition(TaskAction::Cancel)),
        };
        let refund = prior_assignment.as_ref().map(|assignment| RefundRecord {
            payment_id: assignment.payment_id().clone(),
            amount: assignment.split().total(),
            requested_at: now,
        });
        self.state = TaskState::Canceled {
            canceled_at: now,
            canceled_by,
            prior_assignment,
            refund: refund.clone(),
        };
        self.touch(clock);
        Ok(refund)
    }

    /// Contests a completed task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] unless the task is
    /// completed.
    pub fn dispute(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        let TaskState::Completed {
            assignment,
            started_at,
            completed_at,
        } = &self.state
        else {
            return Err(self.invalid_transition(TaskAction::Dispute));
        };
        self.state = TaskState::Disputed {
            assignment: assignment.clone(),
            started_at: *started_at,
            completed_at: *completed_at,
            disputed_at: clock.utc(),
        };
        self.touch(clock);
        Ok(())
    }

    /// Records a refund for a payment that arrived after the task was
    /// canceled.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] unless the task is
    /// canceled without a refund, or [`TaskDomainError::CheckoutMismatch`]
    /// when `session_id` is not the task's checkout.
    pub fn record_late_payment_refund(
        &mut self,
        session_id: &CheckoutSessionId,
        payment_id: PaymentConfirmationId,
        clock: &impl Clock,
    ) -> Result<RefundRecord, TaskDomainError> {
        self.require(TaskAction::ConfirmFunding, |state| {
            matches!(state, TaskState::Canceled { refund: None, .. })
        })?;
        let record = RefundRecord {
            payment_id,
            amount: self.current_checkout(session_id)?.split.total(),
            requested_at: clock.utc(),
        };
        if let TaskState::Canceled { refund, .. } = &mut self.state {
            *refund = Some(record.clone());
        }
        self.touch(clock);
        Ok(record)
    }

    fn current_checkout(
        &self,
        session_id: &CheckoutSessionId,
    ) -> Result<&CheckoutLink, TaskDomainError> {
        self.checkout
            .as_ref()
            .filter(|link| &link.session_id == session_id)
            .ok_or_else(|| TaskDomainError::CheckoutMismatch {
                task_id: self.id,
                session_id: session_id.clone(),
            })
    }

    fn require(
        &self,
        action: TaskAction,
        allowed: impl FnOnce(&TaskState) -> bool,
    ) -> Result<(), TaskDomainError> {
        if allowed(&self.state) {
            Ok(())
        } else {
            Err(self.invalid_transition(action))
        }
    }

    const fn invalid_transition(&self, action: TaskAction) -> TaskDomainError {
        TaskDomainError::InvalidTransition {
            task_id: self.id,
            status: self.state.status(),
            action,
        }
    }

    /// Stamps a mutation and advances the version.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
        self.version = self.version.next();
    }
}
