//! Chat collaborator contract.
//!
//! The lifecycle engine opens one thread per task once funding is confirmed
//! and asks whether a thread holds a proof-of-completion photo. Message
//! storage itself belongs to the chat subsystem; the in-memory adapter here
//! models just enough of it to exercise those two calls.

pub mod adapters;
pub mod domain;
pub mod ports;
