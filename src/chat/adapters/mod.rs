//! Adapter implementations for the chat gateway port.

pub mod memory;

pub use memory::InMemoryChatStore;
