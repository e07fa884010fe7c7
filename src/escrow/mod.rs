//! Escrow gateway integration.
//!
//! The payment processor is an external collaborator. This module defines
//! the contract the lifecycle engine relies on:
//!
//! - [`domain`]: checkout requests, webhook events, and signature checks
//! - [`ports`]: the [`ports::EscrowGateway`] trait
//! - [`adapters`]: an in-memory gateway that records every call
//!
//! Webhook handling that mutates tasks lives in
//! [`crate::task::services::EscrowWebhookService`].

pub mod adapters;
pub mod domain;
pub mod ports;
