//! Port contracts for the escrow gateway.

pub mod gateway;

pub use gateway::{EscrowGateway, EscrowGatewayError, EscrowGatewayResult};
