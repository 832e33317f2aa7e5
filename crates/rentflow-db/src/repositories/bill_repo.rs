//! Utility bill repository implementation
//!
//! PostgreSQL-backed storage for utility bills and their allocations. The
//! allocation persist is the only write path and runs as a single
//! transaction: the bill row is locked, the DRAFT status and the absence of
//! prior allocations are re-checked under the lock, all rows are inserted,
//! and the DRAFT -> PROCESSING transition commits with them. The bill row is
//! the mutual-exclusion point - two concurrent allocation attempts can never
//! both succeed.

use chrono::{DateTime, NaiveDate, Utc};
use rentflow_core::{
    models::{AllocationResult, BillStatus, SplitMethod, UtilityAllocation, UtilityBill},
    traits::BillRepository,
    AllocationError, AppError, AppResult,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

/// PostgreSQL implementation of BillRepository
pub struct PgBillRepository {
    pool: PgPool,
}

impl PgBillRepository {
    /// Create a new bill repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Parse a stored bill status, rejecting unknown values
    ///
    /// A bill with an unparseable status must never be defaulted: the state
    /// machine gates money movement.
    fn parse_status(s: &str) -> AppResult<BillStatus> {
        BillStatus::from_str(s)
            .ok_or_else(|| AppError::Database(format!("unknown bill status '{}'", s)))
    }

    /// Parse a stored split method, rejecting unknown values
    fn parse_method(s: &str) -> AppResult<SplitMethod> {
        SplitMethod::from_str(s)
            .ok_or_else(|| AppError::Database(format!("unknown split method '{}'", s)))
    }
}

#[async_trait]
impl BillRepository for PgBillRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, bill_id: Uuid) -> AppResult<Option<UtilityBill>> {
        debug!("Finding utility bill by id: {}", bill_id);

        let row = sqlx::query_as::<sqlx::Postgres, BillRow>(
            r#"
            SELECT
                id, property_id, provider, total_amount, split_method,
                billing_date, due_date, period_start, period_end,
                status, created_at, updated_at
            FROM utility_bills
            WHERE id = $1
            "#,
        )
        .bind(bill_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding bill {}: {}", bill_id, e);
            AppError::Database(format!("Failed to find bill: {}", e))
        })?;

        row.map(UtilityBill::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn count_allocations(&self, bill_id: Uuid) -> AppResult<i64> {
        let result: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM utility_allocations WHERE bill_id = $1")
                .bind(bill_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    error!("Database error counting allocations: {}", e);
                    AppError::Database(format!("Failed to count allocations: {}", e))
                })?;

        Ok(result.0)
    }

    #[instrument(skip(self))]
    async fn list_allocations(&self, bill_id: Uuid) -> AppResult<Vec<UtilityAllocation>> {
        debug!("Listing allocations for bill: {}", bill_id);

        let rows = sqlx::query_as::<sqlx::Postgres, AllocationRow>(
            r#"
            SELECT a.id, a.bill_id, a.unit_id, a.amount, a.percentage, a.created_at
            FROM utility_allocations a
            JOIN units u ON u.id = a.unit_id
            WHERE a.bill_id = $1
            ORDER BY u.label, u.id
            "#,
        )
        .bind(bill_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing allocations: {}", e);
            AppError::Database(format!("Failed to list allocations: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, results), fields(allocation_count = results.len()))]
    async fn persist_allocation(
        &self,
        bill_id: Uuid,
        results: &[AllocationResult],
    ) -> Result<Vec<UtilityAllocation>, AllocationError> {
        debug!("Persisting {} allocations for bill {}", results.len(), bill_id);

        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            AppError::Transaction(format!("Failed to start transaction: {}", e))
        })?;

        // Lock the bill row; it is the serialization point for concurrent
        // allocation attempts
        let status: Option<(String,)> =
            sqlx::query_as("SELECT status FROM utility_bills WHERE id = $1 FOR UPDATE")
                .bind(bill_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| {
                    error!("Failed to lock bill {}: {}", bill_id, e);
                    AppError::Database(format!("Failed to lock bill: {}", e))
                })?;

        let status = match status {
            Some((s,)) => Self::parse_status(&s)?,
            None => return Err(AllocationError::BillNotFound(bill_id)),
        };

        if !status.can_allocate() {
            return Err(AllocationError::InvalidStatus(status));
        }

        let existing: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM utility_allocations WHERE bill_id = $1")
                .bind(bill_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| AppError::Database(format!("Failed to count allocations: {}", e)))?;

        if existing.0 > 0 {
            return Err(AllocationError::AlreadyAllocated(bill_id));
        }

        let mut allocations = Vec::with_capacity(results.len());
        for result in results {
            let row = sqlx::query_as::<sqlx::Postgres, AllocationRow>(
                r#"
                INSERT INTO utility_allocations (id, bill_id, unit_id, amount, percentage)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, bill_id, unit_id, amount, percentage, created_at
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(bill_id)
            .bind(result.unit_id)
            .bind(result.amount)
            .bind(result.percentage)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                error!("Failed to insert allocation: {}", e);
                AppError::Database(format!("Failed to insert allocation: {}", e))
            })?;

            allocations.push(UtilityAllocation::from(row));
        }

        let updated = sqlx::query(
            r#"
            UPDATE utility_bills
            SET status = $2,
                updated_at = NOW()
            WHERE id = $1 AND status = $3
            "#,
        )
        .bind(bill_id)
        .bind(BillStatus::Processing.to_string())
        .bind(BillStatus::Draft.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to transition bill status: {}", e);
            AppError::Database(format!("Failed to transition bill status: {}", e))
        })?;

        // Guarded transition; with the row lock held this cannot miss
        if updated.rows_affected() != 1 {
            return Err(AllocationError::InvalidStatus(status));
        }

        tx.commit().await.map_err(|e| {
            error!("Failed to commit allocation transaction: {}", e);
            AppError::Transaction(format!("Failed to commit transaction: {}", e))
        })?;

        debug!("Persisted {} allocations for bill {}", allocations.len(), bill_id);

        Ok(allocations)
    }

    #[instrument(skip(self, bill))]
    async fn create(&self, bill: &UtilityBill) -> AppResult<UtilityBill> {
        debug!("Creating utility bill for property: {}", bill.property_id);

        let row = sqlx::query_as::<sqlx::Postgres, BillRow>(
            r#"
            INSERT INTO utility_bills (
                id, property_id, provider, total_amount, split_method,
                billing_date, due_date, period_start, period_end, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING
                id, property_id, provider, total_amount, split_method,
                billing_date, due_date, period_start, period_end,
                status, created_at, updated_at
            "#,
        )
        .bind(bill.id)
        .bind(bill.property_id)
        .bind(&bill.provider)
        .bind(bill.total_amount)
        .bind(bill.split_method.to_string())
        .bind(bill.billing_date)
        .bind(bill.due_date)
        .bind(bill.period_start)
        .bind(bill.period_end)
        .bind(bill.status.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating bill: {}", e);
            AppError::Database(format!("Failed to create bill: {}", e))
        })?;

        UtilityBill::try_from(row)
    }

    #[instrument(skip(self))]
    async fn list_filtered(
        &self,
        property_id: Option<Uuid>,
        status: Option<BillStatus>,
        split_method: Option<SplitMethod>,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<UtilityBill>, i64)> {
        debug!("Listing utility bills with filters");

        let rows = sqlx::query_as::<sqlx::Postgres, BillRow>(
            r#"
            SELECT
                id, property_id, provider, total_amount, split_method,
                billing_date, due_date, period_start, period_end,
                status, created_at, updated_at
            FROM utility_bills
            WHERE ($1::uuid IS NULL OR property_id = $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR split_method = $3)
            ORDER BY billing_date DESC, created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(property_id)
        .bind(status.map(|s| s.to_string()))
        .bind(split_method.map(|m| m.to_string()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing bills: {}", e);
            AppError::Database(format!("Failed to list bills: {}", e))
        })?;

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM utility_bills
            WHERE ($1::uuid IS NULL OR property_id = $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR split_method = $3)
            "#,
        )
        .bind(property_id)
        .bind(status.map(|s| s.to_string()))
        .bind(split_method.map(|m| m.to_string()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error counting bills: {}", e);
            AppError::Database(format!("Failed to count bills: {}", e))
        })?;

        let bills = rows
            .into_iter()
            .map(UtilityBill::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((bills, total.0))
    }
}

/// Helper struct for mapping bill rows
#[derive(Debug, sqlx::FromRow)]
struct BillRow {
    id: Uuid,
    property_id: Uuid,
    provider: String,
    total_amount: Decimal,
    split_method: String,
    billing_date: NaiveDate,
    due_date: NaiveDate,
    period_start: NaiveDate,
    period_end: NaiveDate,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BillRow> for UtilityBill {
    type Error = AppError;

    fn try_from(row: BillRow) -> AppResult<Self> {
        Ok(Self {
            id: row.id,
            property_id: row.property_id,
            provider: row.provider,
            total_amount: row.total_amount,
            split_method: PgBillRepository::parse_method(&row.split_method)?,
            billing_date: row.billing_date,
            due_date: row.due_date,
            period_start: row.period_start,
            period_end: row.period_end,
            status: PgBillRepository::parse_status(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Helper struct for mapping allocation rows
#[derive(Debug, sqlx::FromRow)]
struct AllocationRow {
    id: Uuid,
    bill_id: Uuid,
    unit_id: Uuid,
    amount: Decimal,
    percentage: Decimal,
    created_at: DateTime<Utc>,
}

impl From<AllocationRow> for UtilityAllocation {
    fn from(row: AllocationRow) -> Self {
        Self {
            id: row.id,
            bill_id: row.bill_id,
            unit_id: row.unit_id,
            amount: row.amount,
            percentage: row.percentage,
            created_at: row.created_at,
        }
    }
}
