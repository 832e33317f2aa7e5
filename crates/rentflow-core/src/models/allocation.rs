//! Allocation models
//!
//! [`UtilityAllocation`] is the persisted record of one unit's share of a
//! bill. [`UnitSplitContext`] and [`AllocationResult`] are transient shapes
//! used inside a single allocation run and are never persisted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted allocation row: one unit's monetary share of a bill
///
/// Invariant: for a given bill, the amounts of all its allocations sum to
/// the bill total exactly. Rows are created only by the allocation engine,
/// exactly once per bill, and never updated by this subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilityAllocation {
    /// Unique identifier
    pub id: Uuid,

    /// Bill this allocation belongs to
    pub bill_id: Uuid,

    /// Unit receiving this share
    pub unit_id: Uuid,

    /// Allocated amount, exact to the cent
    pub amount: Decimal,

    /// Share as a percentage (0-100); human-readable, derived,
    /// NOT authoritative for recomputation
    pub percentage: Decimal,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Per-unit hydrated facts for one allocation run
///
/// Built fresh on every attempt from a single consistent snapshot of
/// unit/lease/meter data; each strategy reads only the fields it needs and
/// treats `None` according to its own missing-data policy.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSplitContext {
    /// Unit being allocated to
    pub unit_id: Uuid,

    /// Active lease on the unit, if occupied
    pub lease_id: Option<Uuid>,

    /// Square footage, if the unit-detail record carries one
    pub square_footage: Option<Decimal>,

    /// Occupant count from the active lease's application, if recorded
    pub occupant_count: Option<i32>,

    /// Metered usage (latest reading minus previous) for the billing period
    pub usage_delta: Option<Decimal>,

    /// Configured fixed ratio (0.0-1.0) for custom-ratio splits
    pub custom_ratio: Option<Decimal>,
}

impl UnitSplitContext {
    /// Create an empty context for a unit
    pub fn new(unit_id: Uuid) -> Self {
        Self {
            unit_id,
            lease_id: None,
            square_footage: None,
            occupant_count: None,
            usage_delta: None,
            custom_ratio: None,
        }
    }
}

/// A computed unit/amount/percentage triple
///
/// The output of a split strategy, before and after rounding correction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationResult {
    /// Unit receiving this share
    pub unit_id: Uuid,

    /// Allocated amount (floored to cents by the strategy, then corrected)
    pub amount: Decimal,

    /// Share as a percentage (0-100)
    pub percentage: Decimal,
}

impl AllocationResult {
    pub fn new(unit_id: Uuid, amount: Decimal, percentage: Decimal) -> Self {
        Self {
            unit_id,
            amount,
            percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_context() {
        let unit_id = Uuid::new_v4();
        let ctx = UnitSplitContext::new(unit_id);
        assert_eq!(ctx.unit_id, unit_id);
        assert!(ctx.lease_id.is_none());
        assert!(ctx.square_footage.is_none());
        assert!(ctx.occupant_count.is_none());
        assert!(ctx.usage_delta.is_none());
        assert!(ctx.custom_ratio.is_none());
    }

    #[test]
    fn test_allocation_result_serializes_amounts() {
        let result = AllocationResult::new(Uuid::new_v4(), dec!(33.34), dec!(33.3333));
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"amount\":\"33.34\""));
        assert!(json.contains("\"percentage\":\"33.3333\""));
    }
}
