//! Data Transfer Objects
//!
//! Request/response types for the HTTP API, kept separate from the
//! domain models in rentflow-core.

pub mod common;
pub mod utility_bill;

pub use common::{ApiResponse, PaginationParams};
pub use utility_bill::{
    AllocateBillResponse, AllocationResponse, BillFilterParams, CreateUtilityBillRequest,
    UtilityBillResponse,
};
