//! Unit repository implementation
//!
//! Read-only access to a property's units joined with their single active
//! lease, square footage (from the unit-detail record) and occupant count
//! (from the lease's application). The result order is stable - label, then
//! id - because the rounding corrector targets the LAST unit and allocation
//! output must be reproducible.

use chrono::{DateTime, Utc};
use rentflow_core::{
    models::{Lease, Unit, UnitWithLease},
    traits::UnitRepository,
    AppError, AppResult,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

/// PostgreSQL implementation of UnitRepository
pub struct PgUnitRepository {
    pool: PgPool,
}

impl PgUnitRepository {
    /// Create a new unit repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitRepository for PgUnitRepository {
    #[instrument(skip(self))]
    async fn units_with_active_lease(&self, property_id: Uuid) -> AppResult<Vec<UnitWithLease>> {
        debug!("Loading units with active lease for property: {}", property_id);

        let rows = sqlx::query_as::<sqlx::Postgres, UnitLeaseRow>(
            r#"
            SELECT
                u.id, u.property_id, u.label, u.custom_ratio, u.created_at,
                ud.square_footage,
                l.id AS lease_id, l.created_at AS lease_created_at,
                ap.occupant_count
            FROM units u
            LEFT JOIN unit_details ud ON ud.unit_id = u.id
            LEFT JOIN leases l ON l.unit_id = u.id AND l.status = 'active'
            LEFT JOIN applications ap ON ap.lease_id = l.id
            WHERE u.property_id = $1
            ORDER BY u.label, u.id
            "#,
        )
        .bind(property_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error loading units for {}: {}", property_id, e);
            AppError::Database(format!("Failed to load units: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// Helper struct for mapping unit+lease rows
#[derive(Debug, sqlx::FromRow)]
struct UnitLeaseRow {
    id: Uuid,
    property_id: Uuid,
    label: String,
    custom_ratio: Option<Decimal>,
    created_at: DateTime<Utc>,
    square_footage: Option<Decimal>,
    lease_id: Option<Uuid>,
    lease_created_at: Option<DateTime<Utc>>,
    occupant_count: Option<i32>,
}

impl From<UnitLeaseRow> for UnitWithLease {
    fn from(row: UnitLeaseRow) -> Self {
        let active_lease = row.lease_id.map(|lease_id| Lease {
            id: lease_id,
            unit_id: row.id,
            occupant_count: row.occupant_count,
            created_at: row.lease_created_at.unwrap_or(row.created_at),
        });

        Self {
            unit: Unit {
                id: row.id,
                property_id: row.property_id,
                label: row.label,
                square_footage: row.square_footage,
                custom_ratio: row.custom_ratio,
                created_at: row.created_at,
            },
            active_lease,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(label: &str, lease: bool) -> UnitLeaseRow {
        UnitLeaseRow {
            id: Uuid::new_v4(),
            property_id: Uuid::new_v4(),
            label: label.to_string(),
            custom_ratio: None,
            created_at: Utc::now(),
            square_footage: Some(dec!(750)),
            lease_id: lease.then(Uuid::new_v4),
            lease_created_at: lease.then(Utc::now),
            occupant_count: lease.then_some(2),
        }
    }

    #[test]
    fn test_row_mapping_with_lease() {
        let uwl = UnitWithLease::from(row("2B", true));
        assert_eq!(uwl.unit.label, "2B");
        assert_eq!(uwl.unit.square_footage, Some(dec!(750)));
        assert!(uwl.active_lease.is_some());
        assert_eq!(uwl.occupant_count(), Some(2));
    }

    #[test]
    fn test_row_mapping_vacant() {
        let uwl = UnitWithLease::from(row("3C", false));
        assert!(uwl.active_lease.is_none());
        assert_eq!(uwl.occupant_count(), None);
    }
}
