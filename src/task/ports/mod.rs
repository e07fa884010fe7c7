//! Port contracts for task and offer persistence.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod repository;

pub use repository::{
    OfferRepository, TaskFilter, TaskRepository, TaskRepositoryError, TaskRepositoryResult,
};
