//! Request and response payloads for lifecycle commands.

use crate::{
    escrow::domain::CheckoutSessionId,
    task::domain::{TaskCategory, TaskDetails, TaskDomainError, TaskId},
};
use rust_decimal::Decimal;

/// Payload for posting a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    /// Short headline.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Category name, such as `cleaning`.
    pub category: String,
    /// Postal code.
    pub zip_code: String,
    /// Coarse public location.
    pub area_description: String,
    /// Private street address.
    pub full_address: String,
    /// Price in dollars as entered.
    pub price: Decimal,
    /// Whether completion needs a proof photo.
    pub photo_required: bool,
}

impl CreateTaskRequest {
    pub(super) fn into_details(self) -> Result<(TaskDetails, Decimal), TaskDomainError> {
        let category = TaskCategory::try_from(self.category.as_str())?;
        let details = TaskDetails {
            title: self.title,
            description: self.description,
            category,
            zip_code: self.zip_code,
            area_description: self.area_description,
            full_address: self.full_address,
            photo_required: self.photo_required,
        };
        Ok((details, self.price))
    }
}

/// Payload for offering to do a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOfferRequest {
    /// Target task.
    pub task_id: TaskId,
    /// Message to the poster.
    pub note: String,
    /// Optional counter-price in dollars.
    pub proposed_price: Option<Decimal>,
}

impl SubmitOfferRequest {
    /// Creates a request without a counter-price.
    #[must_use]
    pub fn new(task_id: TaskId, note: impl Into<String>) -> Self {
        Self {
            task_id,
            note: note.into(),
            proposed_price: None,
        }
    }

    /// Sets a counter-price.
    #[must_use]
    pub const fn with_proposed_price(mut self, price: Decimal) -> Self {
        self.proposed_price = Some(price);
        self
    }
}

/// Where to send the poster to pay for a chosen helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRedirect {
    /// Escrow session opened for the selection.
    pub session_id: CheckoutSessionId,
    /// Hosted checkout URL.
    pub redirect_url: String,
}
