//! Caller identity for the marketplace.
//!
//! Every lifecycle operation receives a verified [`domain::Caller`] as an
//! explicit parameter. The [`ports::Authenticator`] port turns an inbound
//! bearer token into that caller; the [`ports::PayoutDirectory`] port answers
//! whether a helper can receive escrow payouts.

pub mod adapters;
pub mod domain;
pub mod ports;
