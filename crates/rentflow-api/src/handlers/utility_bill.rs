//! Utility bill handlers
//!
//! HTTP handlers for bill intake, listing and allocation endpoints.

use crate::dto::utility_bill::{
    AllocateBillResponse, AllocationResponse, BillFilterParams, CreateUtilityBillRequest,
    UtilityBillResponse,
};
use crate::dto::{ApiResponse, PaginationParams};
use crate::BillEngine;
use actix_web::{web, HttpResponse};
use rentflow_core::models::{BillStatus, SplitMethod};
use rentflow_core::traits::BillRepository;
use rentflow_core::{AllocationError, AppError};
use rentflow_db::PgBillRepository;
use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Create a utility bill
///
/// POST /api/v1/utility-bills
///
/// Thin intake: the bill is stored in DRAFT; allocation is a separate call.
#[instrument(skip(pool, req))]
pub async fn create_bill(
    pool: web::Data<PgPool>,
    req: web::Json<CreateUtilityBillRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Bill creation validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;
    req.check_coherence().map_err(|e| {
        warn!("Bill creation coherence check failed: {}", e);
        AppError::Validation(e)
    })?;

    debug!(
        property_id = %req.property_id,
        provider = %req.provider,
        method = %req.split_method,
        "Creating utility bill"
    );

    let repo = PgBillRepository::new(pool.get_ref().clone());
    let created = repo.create(&req.to_bill()).await?;

    info!(
        bill_id = %created.id,
        total = %created.total_amount,
        "Utility bill created"
    );

    let response = UtilityBillResponse::from(created);
    Ok(HttpResponse::Created().json(ApiResponse::with_message(
        response,
        "Utility bill created",
    )))
}

/// List utility bills with pagination and filters
///
/// GET /api/v1/utility-bills
#[instrument(skip(pool))]
pub async fn list_bills(
    pool: web::Data<PgPool>,
    query: web::Query<PaginationParams>,
    filters: web::Query<BillFilterParams>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Pagination validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let status = filters
        .status
        .as_deref()
        .map(|s| {
            BillStatus::from_str(s)
                .ok_or_else(|| AppError::Validation(format!("Unknown bill status: {}", s)))
        })
        .transpose()?;

    let split_method = filters
        .split_method
        .as_deref()
        .map(|s| {
            SplitMethod::from_str(s)
                .ok_or_else(|| AppError::Validation(format!("Unknown split method: {}", s)))
        })
        .transpose()?;

    debug!(
        page = query.page,
        per_page = query.per_page,
        property_id = ?filters.property_id,
        status = ?status,
        "Listing utility bills"
    );

    let repo = PgBillRepository::new(pool.get_ref().clone());
    let (bills, total) = repo
        .list_filtered(
            filters.property_id,
            status,
            split_method,
            query.limit(),
            query.offset(),
        )
        .await?;

    let response_data: Vec<UtilityBillResponse> = bills.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(query.paginate(response_data, total)))
}

/// Get a single utility bill by ID
///
/// GET /api/v1/utility-bills/{id}
#[instrument(skip(pool))]
pub async fn get_bill(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let bill_id = path.into_inner();
    debug!(bill_id = %bill_id, "Getting utility bill");

    let repo = PgBillRepository::new(pool.get_ref().clone());
    let bill = repo
        .find_by_id(bill_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Utility bill {} not found", bill_id)))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(UtilityBillResponse::from(bill))))
}

/// Allocate a utility bill across its property's units
///
/// POST /api/v1/utility-bills/{id}/allocate
///
/// The engine owns every precondition; failures surface as the closed
/// allocation error taxonomy with its own status mapping.
#[instrument(skip(engine))]
pub async fn allocate_bill(
    engine: web::Data<BillEngine>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AllocationError> {
    let bill_id = path.into_inner();
    debug!(bill_id = %bill_id, "Allocation requested");

    let outcome = engine.allocate_bill(bill_id).await?;

    info!(
        bill_id = %bill_id,
        allocations = outcome.allocations.len(),
        "Bill allocated"
    );

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        AllocateBillResponse::from_outcome(bill_id, outcome),
        "Bill allocated",
    )))
}

/// List allocations for a bill
///
/// GET /api/v1/utility-bills/{id}/allocations
#[instrument(skip(pool))]
pub async fn list_allocations(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let bill_id = path.into_inner();
    debug!(bill_id = %bill_id, "Listing allocations");

    let repo = PgBillRepository::new(pool.get_ref().clone());

    // 404 for unknown bills rather than an empty list
    repo.find_by_id(bill_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Utility bill {} not found", bill_id)))?;

    let allocations = repo.list_allocations(bill_id).await?;
    let response_data: Vec<AllocationResponse> =
        allocations.into_iter().map(Into::into).collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(response_data)))
}

/// Configure utility bill routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/utility-bills")
            .route("", web::get().to(list_bills))
            .route("", web::post().to(create_bill))
            .route("/{id}", web::get().to(get_bill))
            .route("/{id}/allocate", web::post().to(allocate_bill))
            .route("/{id}/allocations", web::get().to(list_allocations)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter_parsing() {
        assert_eq!(BillStatus::from_str("draft"), Some(BillStatus::Draft));
        assert_eq!(BillStatus::from_str("garbage"), None);
    }

    #[test]
    fn test_split_method_filter_parsing() {
        assert_eq!(
            SplitMethod::from_str("sub_metered"),
            Some(SplitMethod::SubMetered)
        );
        assert_eq!(SplitMethod::from_str("per_pet"), None);
    }
}
