//! Errand: task lifecycle and escrow engine for a local-services
//! marketplace.
//!
//! Posters publish errands, helpers offer to do them, and the poster's
//! payment is held in escrow until the work is done. The crate owns the task
//! state machine and the rules that decide when money is captured, released,
//! or refunded.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, gateways)
//! - **Services**: Orchestration of domain transitions and port calls
//!
//! # Modules
//!
//! - [`task`]: Tasks, offers, the lifecycle engine, and webhook intake
//! - [`escrow`]: Payment gateway port and webhook verification
//! - [`chat`]: Poster/helper chat threads and proof-of-work messages
//! - [`identity`]: Callers, bearer tokens, and payout profiles
//! - [`config`]: Environment-driven settings
//! - [`error`]: Caller-facing error classification

pub mod chat;
pub mod config;
pub mod error;
pub mod escrow;
pub mod identity;
pub mod task;
