//! Request and response shapes exchanged with the escrow gateway.

use super::{CheckoutSessionId, PaymentConfirmationId};
use crate::{
    identity::domain::{PayoutAccountId, UserId},
    task::domain::{Money, OfferId, TaskId},
};
use serde::{Deserialize, Serialize};

/// Correlation data attached to a checkout session and echoed back by the
/// completion webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationMetadata {
    /// Task being funded.
    pub task_id: TaskId,
    /// Poster paying for the task.
    pub poster_id: UserId,
    /// Helper receiving the payout.
    pub helper_id: UserId,
    /// Offer chosen by the poster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<OfferId>,
}

/// Client redirect targets for a hosted checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRedirects {
    /// Target after successful payment.
    pub success_url: String,
    /// Target after the poster abandons the checkout.
    pub cancel_url: String,
}

/// Request to open a hosted escrow checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Line item title shown on the checkout page.
    pub title: String,
    /// Line item description.
    pub description: String,
    /// Total charged to the poster.
    pub total: Money,
    /// Portion retained by the platform.
    pub platform_fee: Money,
    /// Connected account receiving the remainder.
    pub destination: PayoutAccountId,
    /// Correlation data echoed by the webhook.
    pub metadata: CorrelationMetadata,
    /// Client redirect targets.
    pub redirects: CheckoutRedirects,
}

/// Hosted checkout session returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Gateway session identifier.
    pub id: CheckoutSessionId,
    /// URL the poster visits to pay.
    pub redirect_url: String,
}

/// Request to release escrowed funds to the helper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRequest {
    /// Completed task.
    pub task_id: TaskId,
    /// Captured payment being released.
    pub payment_id: PaymentConfirmationId,
    /// Helper's connected account.
    pub destination: PayoutAccountId,
    /// Amount owed to the helper.
    pub amount: Money,
}

/// Request to refund a captured payment to the poster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRequest {
    /// Task the payment was captured for.
    pub task_id: TaskId,
    /// Captured payment being refunded.
    pub payment_id: PaymentConfirmationId,
    /// Amount to refund.
    pub amount: Money,
}
