//! Chat domain types referenced by the lifecycle engine.

mod error;
mod message;
mod thread;

pub use error::ChatDomainError;
pub use message::{ChatMessage, MessageBody};
pub use thread::{ChatThread, ThreadId};
