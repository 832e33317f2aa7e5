//! Unit and lease models
//!
//! Units are the targets of an allocation; each unit carries at most one
//! active lease. The allocation engine never mutates these - they are
//! read-side projections owned by the property/lease subsystems.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rental unit within a property
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    /// Unique identifier
    pub id: Uuid,

    /// Owning property
    pub property_id: Uuid,

    /// Human-readable label (e.g. "Unit 2B")
    pub label: String,

    /// Square footage from the linked unit-detail record, if recorded
    pub square_footage: Option<Decimal>,

    /// Fixed allocation ratio (0.0-1.0) for custom-ratio splits, if configured
    pub custom_ratio: Option<Decimal>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Active lease on a unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lease {
    /// Unique identifier
    pub id: Uuid,

    /// Leased unit
    pub unit_id: Uuid,

    /// Occupant count from the lease's application record, if recorded
    pub occupant_count: Option<i32>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// A unit joined with its single active lease, if any
///
/// This is the shape the hydrator consumes. Units are always returned in a
/// stable order (label, then id) so that allocation output - in particular
/// which unit absorbs the rounding correction - is reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitWithLease {
    pub unit: Unit,
    pub active_lease: Option<Lease>,
}

impl UnitWithLease {
    /// Identifier of the active lease, if the unit is occupied
    #[inline]
    pub fn lease_id(&self) -> Option<Uuid> {
        self.active_lease.as_ref().map(|l| l.id)
    }

    /// Occupant count of the active lease, if known
    #[inline]
    pub fn occupant_count(&self) -> Option<i32> {
        self.active_lease.as_ref().and_then(|l| l.occupant_count)
    }
}
