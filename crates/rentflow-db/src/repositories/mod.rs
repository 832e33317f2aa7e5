//! Repository implementations
//!
//! This module contains concrete implementations of the port traits
//! defined in rentflow-core, using sqlx for PostgreSQL access.

pub mod bill_repo;
pub mod meter_repo;
pub mod unit_repo;

pub use bill_repo::PgBillRepository;
pub use meter_repo::PgMeterReadingRepository;
pub use unit_repo::PgUnitRepository;
