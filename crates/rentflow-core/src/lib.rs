//! RentFlow Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! for the RentFlow property-management backend. It includes:
//!
//! - Domain models (UtilityBill, UtilityAllocation, Unit, MeterReading, etc.)
//! - Repository port traits for the allocation engine
//! - Unified error handling with HTTP response mapping
//! - Application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod traits;

pub use config::AppConfig;
pub use error::{AllocationError, AppError};

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
