//! Meter reading model
//!
//! Time-ordered readings per lease, used by the sub-metered split strategy.
//! Usage for a billing period is the delta between the two most recent
//! readings.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recorded meter reading for a lease
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterReading {
    /// Unique identifier
    pub id: Uuid,

    /// Lease the meter belongs to
    pub lease_id: Uuid,

    /// Cumulative meter value at read time
    pub reading_value: Decimal,

    /// When the reading was taken
    pub read_at: DateTime<Utc>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl MeterReading {
    /// Usage between a previous reading and this one
    ///
    /// A negative result indicates corrupt data (meters are cumulative) and
    /// must fail the hydration batch, not be clamped.
    pub fn usage_since(&self, previous: &MeterReading) -> Decimal {
        self.reading_value - previous.reading_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn reading(value: Decimal) -> MeterReading {
        MeterReading {
            id: Uuid::new_v4(),
            lease_id: Uuid::new_v4(),
            reading_value: value,
            read_at: Utc::now(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_usage_since() {
        let previous = reading(dec!(1200.5));
        let latest = reading(dec!(1250.0));
        assert_eq!(latest.usage_since(&previous), dec!(49.5));
    }

    #[test]
    fn test_usage_since_detects_regression() {
        let previous = reading(dec!(1250.0));
        let latest = reading(dec!(1200.0));
        assert!(latest.usage_since(&previous) < Decimal::ZERO);
    }
}
