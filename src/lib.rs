//! Schema-driven admin API over PostgreSQL.
//!
//! Tables, columns and foreign keys are discovered from `information_schema`
//! on every request; reads and writes are built as parameterized SQL with
//! quoted identifiers.

pub mod config;
pub mod core;
pub mod models;
pub mod records;
pub mod repository;
pub mod sql;
pub mod web;

pub use crate::core::{AdminError, AdminResult, NormalizedType, Value};
pub use repository::{AdminRepository, InMemoryAdminRepository, PgAdminRepository};
pub use web::{AppState, build_router};
