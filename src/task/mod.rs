//! Task lifecycle for the marketplace.
//!
//! A task moves from `requested` through funding, work, and completion, or
//! ends early in `canceled`. Offers belong to a task and are settled in the
//! same unit of work that binds the paying helper. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
