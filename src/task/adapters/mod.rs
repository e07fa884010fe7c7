//! Adapter implementations for task and offer persistence.

pub mod memory;
pub mod postgres;
