//! Domain models for RentFlow
//!
//! This module contains all the core domain models used throughout the application.

pub mod allocation;
pub mod bill;
pub mod meter;
pub mod unit;

pub use allocation::{AllocationResult, UnitSplitContext, UtilityAllocation};
pub use bill::{BillStatus, SplitMethod, UtilityBill};
pub use meter::MeterReading;
pub use unit::{Lease, Unit, UnitWithLease};
