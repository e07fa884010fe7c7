//! Domain model for the task, offer, and payment lifecycle.
//!
//! A task moves from `requested` through escrow funding to completion,
//! cancellation, or dispute. Every transition lives on [`Task`] so the
//! services only orchestrate storage and collaborators.

mod category;
mod error;
mod ids;
mod money;
mod offer;
mod status;
mod task;
mod view;

pub use category::TaskCategory;
pub use error::{ParseStatusError, TaskDomainError};
pub use ids::{ConfirmationCode, OfferId, TaskId, TaskVersion};
pub use money::{EscrowSplit, FeePercent, Money};
pub use offer::{Offer, OfferStatus, PersistedOfferData};
pub use status::{CancelingParty, PaymentStatus, TaskAction, TaskStatus};
pub use task::{
    Assignment, CheckoutLink, PersistedTaskData, RefundRecord, Task, TaskDetails, TaskState,
};
pub use view::TaskView;
