//! Port contracts for the chat collaborator.

pub mod gateway;

pub use gateway::{ChatError, ChatGateway, ChatResult};
