//! API layer for RentFlow
//!
//! HTTP handlers and DTOs for utility bill intake and allocation.

#![forbid(unsafe_code)]

pub mod dto;
pub mod handlers;

use rentflow_db::{PgBillRepository, PgMeterReadingRepository, PgUnitRepository};
use rentflow_services::AllocationEngine;

/// The allocation engine wired against the PostgreSQL repositories
///
/// Constructed once in main and shared with handlers through `web::Data`.
pub type BillEngine =
    AllocationEngine<PgBillRepository, PgUnitRepository, PgMeterReadingRepository>;

// Re-export DTOs (common types)
pub use dto::{ApiResponse, PaginationParams};

// Re-export handler configuration functions
pub use handlers::{configure_health, configure_utility_bills};
