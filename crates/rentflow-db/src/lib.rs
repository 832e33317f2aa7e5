//! RentFlow Database Layer
//!
//! This crate provides PostgreSQL database access and repository
//! implementations for the RentFlow allocation engine. It includes:
//!
//! - Connection pool management with sqlx
//! - Repository implementations for the core port traits
//! - The atomic allocation persist (rows + status transition in one
//!   transaction)

pub mod pool;
pub mod repositories;

pub use pool::create_pool;
pub use repositories::*;

// Re-export commonly used types
pub use rentflow_core::{AppError, AppResult};
pub use sqlx::{PgPool, Postgres, Transaction};
