//! `PostgreSQL` adapter storing tasks and their offers.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresTaskRepository, TaskPgPool};
