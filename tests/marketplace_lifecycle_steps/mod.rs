//! Step definitions for marketplace lifecycle scenarios.

pub mod world;

mod given;
mod then;
mod when;
