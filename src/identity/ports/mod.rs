//! Port contracts for identity resolution and payout readiness.

pub mod authenticator;
pub mod payout;

pub use authenticator::{Authenticator, IdentityError, IdentityResult};
pub use payout::{PayoutDirectory, PayoutDirectoryError, PayoutDirectoryResult};
