//! Adapter implementations for identity ports.

pub mod memory;
pub mod token;

pub use memory::InMemoryPayoutDirectory;
pub use token::{HmacTokenAuthenticator, TokenClaims};
