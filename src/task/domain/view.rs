//! Caller-specific read model of a task.

use super::{
    CancelingParty, ConfirmationCode, Money, PaymentStatus, Task, TaskCategory, TaskId,
    TaskStatus,
};
use crate::identity::domain::{Caller, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Task as returned to one caller.
///
/// The full address and confirmation code are present only for the poster,
/// the assigned helper, and admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    /// Task identifier.
    pub id: TaskId,
    /// Headline.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Kind of work.
    pub category: TaskCategory,
    /// Postal code.
    pub zip_code: String,
    /// Coarse public location.
    pub area_description: String,
    /// Street address, when visible to the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_address: Option<String>,
    /// Price charged at checkout.
    pub price: Money,
    /// Whether completion needs proof.
    pub photo_required: bool,
    /// Lifecycle status.
    pub status: TaskStatus,
    /// Payment position.
    pub payment_status: PaymentStatus,
    /// Poster.
    pub poster_id: UserId,
    /// Poster display name.
    pub poster_name: String,
    /// Bound helper.
    pub helper_id: Option<UserId>,
    /// Bound helper display name.
    pub helper_name: Option<String>,
    /// Platform commission once funded.
    pub platform_fee: Option<Money>,
    /// Helper's share once funded.
    pub helper_amount: Option<Money>,
    /// Confirmation code, when visible to the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_code: Option<ConfirmationCode>,
    /// Party that canceled.
    pub canceled_by: Option<CancelingParty>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Funding time.
    pub accepted_at: Option<DateTime<Utc>>,
    /// Work start time.
    pub started_at: Option<DateTime<Utc>>,
    /// Completion time.
    pub completed_at: Option<DateTime<Utc>>,
    /// Dispute time.
    pub disputed_at: Option<DateTime<Utc>>,
    /// Cancellation time.
    pub canceled_at: Option<DateTime<Utc>>,
    /// Latest mutation time.
    pub updated_at: DateTime<Utc>,
}

impl TaskView {
    /// Projects `task` for `caller`.
    #[must_use]
    pub fn for_caller(task: &Task, caller: &Caller) -> Self {
        let private = task.can_view_private_details(caller);
        let details = task.details();
        let assignment = task.assignment();
        Self {
            id: task.id(),
            title: details.title.clone(),
            description: details.description.clone(),
            category: details.category,
            zip_code: details.zip_code.clone(),
            area_description: details.area_description.clone(),
            full_address: private.then(|| details.full_address.clone()),
            price: task.price(),
            photo_required: details.photo_required,
            status: task.status(),
            payment_status: task.payment_status(),
            poster_id: task.poster_id().clone(),
            poster_name: task.poster_name().to_owned(),
            helper_id: assignment.map(|bound| bound.helper_id().clone()),
            helper_name: assignment.map(|bound| bound.helper_name().to_owned()),
            platform_fee: assignment.map(|bound| bound.split().platform_fee()),
            helper_amount: assignment.map(|bound| bound.split().helper_amount()),
            confirmation_code: private.then(|| task.confirmation_code().clone()),
            canceled_by: task.canceled_by(),
            created_at: task.created_at(),
            accepted_at: task.accepted_at(),
            started_at: task.started_at(),
            completed_at: task.completed_at(),
            disputed_at: task.disputed_at(),
            canceled_at: task.canceled_at(),
            updated_at: task.updated_at(),
        }
    }
}
