//! Identity domain types.

mod caller;
mod error;
mod ids;

pub use caller::{Caller, Role};
pub use error::IdentityDomainError;
pub use ids::{PayoutAccountId, PayoutProfile, UserId};
