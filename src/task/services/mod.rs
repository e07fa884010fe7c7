//! Application services for the task, offer, and payment lifecycle.

mod error;
mod lifecycle;
mod requests;
mod settlement;
mod webhook;

pub use error::{TaskLifecycleError, TaskLifecycleResult};
pub use lifecycle::TaskLifecycleService;
pub use requests::{CheckoutRedirect, CreateTaskRequest, SubmitOfferRequest};
pub use webhook::{EscrowWebhookService, WebhookError, WebhookOutcome};
