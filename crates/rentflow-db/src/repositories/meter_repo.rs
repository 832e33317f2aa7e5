//! Meter reading repository implementation
//!
//! Batch access to meter readings for the sub-metered split. The two most
//! recent readings for every lease in scope come back from ONE windowed
//! query - never one query per lease.

use chrono::{DateTime, Utc};
use rentflow_core::{
    models::MeterReading, traits::MeterReadingRepository, AppError, AppResult,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{debug, error, instrument};
use uuid::Uuid;

/// PostgreSQL implementation of MeterReadingRepository
pub struct PgMeterReadingRepository {
    pool: PgPool,
}

impl PgMeterReadingRepository {
    /// Create a new meter reading repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MeterReadingRepository for PgMeterReadingRepository {
    #[instrument(skip(self), fields(lease_count = lease_ids.len()))]
    async fn latest_two_readings(
        &self,
        lease_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, Vec<MeterReading>>> {
        if lease_ids.is_empty() {
            return Ok(HashMap::new());
        }

        debug!("Batch-fetching latest readings for {} leases", lease_ids.len());

        let rows = sqlx::query_as::<sqlx::Postgres, MeterReadingRow>(
            r#"
            SELECT id, lease_id, reading_value, read_at, created_at
            FROM (
                SELECT id, lease_id, reading_value, read_at, created_at,
                       ROW_NUMBER() OVER (
                           PARTITION BY lease_id
                           ORDER BY read_at DESC, created_at DESC
                       ) AS rn
                FROM meter_readings
                WHERE lease_id = ANY($1)
            ) ranked
            WHERE rn <= 2
            ORDER BY lease_id, read_at DESC
            "#,
        )
        .bind(lease_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error fetching meter readings: {}", e);
            AppError::Database(format!("Failed to fetch meter readings: {}", e))
        })?;

        // Newest-first per lease, preserved by the query ordering
        let mut by_lease: HashMap<Uuid, Vec<MeterReading>> = HashMap::new();
        for row in rows {
            by_lease
                .entry(row.lease_id)
                .or_default()
                .push(row.into());
        }

        Ok(by_lease)
    }
}

/// Helper struct for mapping meter reading rows
#[derive(Debug, sqlx::FromRow)]
struct MeterReadingRow {
    id: Uuid,
    lease_id: Uuid,
    reading_value: Decimal,
    read_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<MeterReadingRow> for MeterReading {
    fn from(row: MeterReadingRow) -> Self {
        Self {
            id: row.id,
            lease_id: row.lease_id,
            reading_value: row.reading_value,
            read_at: row.read_at,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_row_mapping() {
        let now = Utc::now();
        let row = MeterReadingRow {
            id: Uuid::new_v4(),
            lease_id: Uuid::new_v4(),
            reading_value: dec!(1523.7),
            read_at: now,
            created_at: now,
        };

        let reading = MeterReading::from(row);
        assert_eq!(reading.reading_value, dec!(1523.7));
        assert_eq!(reading.read_at, now);
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_latest_two_readings_empty_input() {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/rentflow".to_string());
        let config = rentflow_core::config::DatabaseConfig {
            url: database_url,
            max_connections: 2,
            min_connections: 1,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 60,
        };
        let pool = crate::create_pool(&config).await.unwrap();

        let repo = PgMeterReadingRepository::new(pool);
        let readings = repo.latest_two_readings(&[]).await.unwrap();
        assert!(readings.is_empty());
    }
}
