//! Adapter implementations for the escrow gateway port.

pub mod memory;

pub use memory::InMemoryEscrowGateway;
