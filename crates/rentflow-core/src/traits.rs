//! Repository port traits
//!
//! The allocation engine takes these as explicit dependencies (no shared
//! process-wide handles); `rentflow-db` provides the PostgreSQL
//! implementations and tests provide mocks.

use crate::error::{AllocationError, AppError};
use crate::models::{
    AllocationResult, BillStatus, MeterReading, SplitMethod, UnitWithLease, UtilityAllocation,
    UtilityBill,
};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Utility bill repository
///
/// Covers the bill reads the engine needs plus the single write it is
/// allowed to make: the atomic allocation persist.
#[async_trait]
pub trait BillRepository: Send + Sync {
    /// Find a bill by id
    async fn find_by_id(&self, bill_id: Uuid) -> Result<Option<UtilityBill>, AppError>;

    /// Count existing allocations for a bill
    async fn count_allocations(&self, bill_id: Uuid) -> Result<i64, AppError>;

    /// List allocations for a bill in unit iteration order
    async fn list_allocations(&self, bill_id: Uuid) -> Result<Vec<UtilityAllocation>, AppError>;

    /// Atomically insert allocation rows and transition DRAFT -> PROCESSING
    ///
    /// The status re-check and the no-prior-allocations check run inside the
    /// same transaction as the inserts, so two concurrent attempts on one
    /// bill can never both succeed: the loser sees `AlreadyAllocated` or
    /// `InvalidStatus` depending on race timing. Either every row and the
    /// transition commit, or nothing does.
    async fn persist_allocation(
        &self,
        bill_id: Uuid,
        results: &[AllocationResult],
    ) -> Result<Vec<UtilityAllocation>, AllocationError>;

    /// Insert a new DRAFT bill (intake flow)
    async fn create(&self, bill: &UtilityBill) -> Result<UtilityBill, AppError>;

    /// List bills with optional filtering
    async fn list_filtered(
        &self,
        property_id: Option<Uuid>,
        status: Option<BillStatus>,
        split_method: Option<SplitMethod>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<UtilityBill>, i64), AppError>;
}

/// Unit repository (read-only for this subsystem)
#[async_trait]
pub trait UnitRepository: Send + Sync {
    /// Load a property's units, each joined with its single active lease
    ///
    /// Order must be stable and deterministic across calls (label, then id):
    /// the rounding corrector targets the LAST unit in this order.
    async fn units_with_active_lease(
        &self,
        property_id: Uuid,
    ) -> Result<Vec<UnitWithLease>, AppError>;
}

/// Meter reading repository (read-only for this subsystem)
#[async_trait]
pub trait MeterReadingRepository: Send + Sync {
    /// Batch-fetch the two most recent readings per lease in ONE query
    ///
    /// Readings are returned newest-first per lease. Leases with fewer than
    /// two readings appear with however many they have (possibly absent from
    /// the map); the hydrator decides that the batch is unusable.
    async fn latest_two_readings(
        &self,
        lease_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<MeterReading>>, AppError>;
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(total: i64, page: i64, per_page: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };

        Self {
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_meta() {
        let meta = PaginationMeta::new(95, 1, 10);
        assert_eq!(meta.total_pages, 10);

        let meta = PaginationMeta::new(101, 1, 10);
        assert_eq!(meta.total_pages, 11);
    }
}
