//! Unified error handling for RentFlow
//!
//! Two layers of errors live here:
//!
//! - [`AppError`] - ambient application errors (database, configuration,
//!   validation, ...) with automatic HTTP response mapping.
//! - [`AllocationError`] - the closed failure taxonomy of the utility bill
//!   allocation engine. Every expected failure of an allocation attempt is a
//!   distinct, machine-checkable variant; only genuinely exceptional storage
//!   failures pass through as the `Storage` variant.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::BillStatus;

/// Main application error type
///
/// All ambient errors in the application should be converted to this type.
/// It implements `ResponseError` for automatic HTTP response generation.
#[derive(Error, Debug)]
pub enum AppError {
    // ==================== Database Errors ====================
    #[error("Database error: {0}")]
    Database(String),

    #[error("Database pool error: {0}")]
    Pool(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    // ==================== Validation Errors ====================
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    // ==================== Resource Errors ====================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // ==================== Internal Errors ====================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation(_) | AppError::InvalidInput(_) | AppError::MissingField(_) => {
                StatusCode::BAD_REQUEST
            }

            // 404 Not Found
            AppError::NotFound(_) => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::Conflict(_) => StatusCode::CONFLICT,

            // 500 Internal Server Error
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::Pool(_) => "pool_error",
            AppError::Transaction(_) => "transaction_error",
            AppError::Validation(_) => "validation_error",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::MissingField(_) => "missing_field",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
            AppError::Serialization(_) => "serialization_error",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = json!({
            "error": self.error_code(),
            "message": self.to_string(),
            "status": status.as_u16(),
        });

        HttpResponse::build(status).json(body)
    }
}

// ==================== From implementations ====================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Closed failure taxonomy of the allocation engine
///
/// Every expected failure mode of `allocate_bill` maps to exactly one
/// variant so that upstream consumers can render an actionable message.
/// Callers match on the variant (or its [`AllocationError::code`]) rather
/// than parsing free text.
#[derive(Error, Debug)]
pub enum AllocationError {
    /// The referenced bill does not exist
    #[error("Utility bill not found: {0}")]
    BillNotFound(Uuid),

    /// The bill is not in a state that permits allocation
    ///
    /// POSTED bills are immutable; any non-DRAFT state rejects allocation.
    #[error("Bill cannot be allocated in status {0}")]
    InvalidStatus(BillStatus),

    /// The bill total is not a positive amount
    #[error("Bill total must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// The bill's property has no units to allocate across
    #[error("No units found for property {0}")]
    NoUnitsFound(Uuid),

    /// The chosen split method is missing required per-unit data
    #[error("Missing split data: {0}")]
    MissingSplitData(String),

    /// Corrected allocations do not sum to the bill total
    ///
    /// Defensive check before persistence; should never trigger with a
    /// correct rounding pass.
    #[error("Allocation sum {actual} does not match bill total {expected}")]
    SumMismatch { expected: Decimal, actual: Decimal },

    /// Allocations already exist for this bill (one-shot operation)
    #[error("Bill {0} has already been allocated")]
    AlreadyAllocated(Uuid),

    /// Unexpected persistence-layer failure, outside the engine taxonomy
    #[error(transparent)]
    Storage(#[from] AppError),
}

impl AllocationError {
    /// Returns the machine-checkable error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            AllocationError::BillNotFound(_) => "BILL_NOT_FOUND",
            AllocationError::InvalidStatus(_) => "INVALID_STATUS",
            AllocationError::InvalidAmount(_) => "INVALID_AMOUNT",
            AllocationError::NoUnitsFound(_) => "NO_UNITS_FOUND",
            AllocationError::MissingSplitData(_) => "MISSING_SPLIT_DATA",
            AllocationError::SumMismatch { .. } => "SUM_MISMATCH",
            AllocationError::AlreadyAllocated(_) => "ALREADY_ALLOCATED",
            AllocationError::Storage(inner) => inner.error_code(),
        }
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AllocationError::BillNotFound(_) => StatusCode::NOT_FOUND,
            AllocationError::InvalidStatus(_) | AllocationError::AlreadyAllocated(_) => {
                StatusCode::CONFLICT
            }
            AllocationError::InvalidAmount(_)
            | AllocationError::NoUnitsFound(_)
            | AllocationError::MissingSplitData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AllocationError::SumMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AllocationError::Storage(inner) => inner.status_code(),
        }
    }
}

impl ResponseError for AllocationError {
    fn status_code(&self) -> StatusCode {
        AllocationError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = json!({
            "error": self.code(),
            "message": self.to_string(),
            "status": status.as_u16(),
        });

        HttpResponse::build(status).json(body)
    }
}
