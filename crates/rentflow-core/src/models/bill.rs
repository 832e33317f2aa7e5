//! Utility bill model
//!
//! Represents one provider invoice for a property, together with the
//! lifecycle state machine that gates allocation.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Bill lifecycle status
///
/// DRAFT -> PROCESSING -> REVIEW_REQUIRED/APPROVED -> POSTED, with REJECTED
/// reachable from any pre-POSTED state. Only the DRAFT -> PROCESSING edge is
/// taken by the allocation engine; the remaining edges belong to external
/// approval/posting workflows. POSTED is terminal and immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    /// Newly created bill, not yet allocated
    #[default]
    Draft,
    /// Allocated across units, awaiting review/approval
    Processing,
    /// Flagged for manual review
    ReviewRequired,
    /// Approved, awaiting posting
    Approved,
    /// Rejected by a review workflow
    Rejected,
    /// Posted to the ledger - immutable
    Posted,
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BillStatus::Draft => write!(f, "draft"),
            BillStatus::Processing => write!(f, "processing"),
            BillStatus::ReviewRequired => write!(f, "review_required"),
            BillStatus::Approved => write!(f, "approved"),
            BillStatus::Rejected => write!(f, "rejected"),
            BillStatus::Posted => write!(f, "posted"),
        }
    }
}

impl BillStatus {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(BillStatus::Draft),
            "processing" => Some(BillStatus::Processing),
            "review_required" => Some(BillStatus::ReviewRequired),
            "approved" => Some(BillStatus::Approved),
            "rejected" => Some(BillStatus::Rejected),
            "posted" => Some(BillStatus::Posted),
            _ => None,
        }
    }

    /// Check whether this bill may be allocated
    ///
    /// Allocation is only legal from DRAFT.
    pub fn can_allocate(&self) -> bool {
        matches!(self, BillStatus::Draft)
    }

    /// Check whether this status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, BillStatus::Posted | BillStatus::Rejected)
    }

    /// Check whether a transition to `next` is legal
    ///
    /// Encodes the full lifecycle graph so that external approval/posting
    /// workflows share one transition table. The engine itself only ever
    /// performs DRAFT -> PROCESSING.
    pub fn can_transition_to(&self, next: BillStatus) -> bool {
        use BillStatus::*;
        match (self, next) {
            (Draft, Processing) => true,
            (Processing, ReviewRequired) | (Processing, Approved) => true,
            (ReviewRequired, Approved) => true,
            (Approved, Posted) => true,
            // REJECTED is reachable from any pre-POSTED state
            (Draft, Rejected)
            | (Processing, Rejected)
            | (ReviewRequired, Rejected)
            | (Approved, Rejected) => true,
            _ => false,
        }
    }
}

/// Split method enumeration
///
/// The algorithm used to divide a bill's total across the property's units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SplitMethod {
    /// Divide the total equally across all units
    #[default]
    Equal,
    /// Weight by each unit's square footage
    SquareFootage,
    /// Weight by each unit's occupant count
    Occupancy,
    /// Weight by metered usage delta per unit
    SubMetered,
    /// Fixed per-unit ratios summing to 1.0
    CustomRatio,
}

impl fmt::Display for SplitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitMethod::Equal => write!(f, "equal"),
            SplitMethod::SquareFootage => write!(f, "square_footage"),
            SplitMethod::Occupancy => write!(f, "occupancy"),
            SplitMethod::SubMetered => write!(f, "sub_metered"),
            SplitMethod::CustomRatio => write!(f, "custom_ratio"),
        }
    }
}

impl SplitMethod {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "equal" => Some(SplitMethod::Equal),
            "square_footage" => Some(SplitMethod::SquareFootage),
            "occupancy" => Some(SplitMethod::Occupancy),
            "sub_metered" => Some(SplitMethod::SubMetered),
            "custom_ratio" => Some(SplitMethod::CustomRatio),
            _ => None,
        }
    }
}

/// Utility bill entity
///
/// One provider invoice for a multi-unit property. The `total_amount` is the
/// value the allocation engine must partition exactly across units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilityBill {
    /// Unique identifier
    pub id: Uuid,

    /// Property the bill belongs to
    pub property_id: Uuid,

    /// Utility provider name (e.g. "City Power & Light")
    pub provider: String,

    /// Invoice total; must be positive
    pub total_amount: Decimal,

    /// Chosen split algorithm
    pub split_method: SplitMethod,

    /// Invoice date
    pub billing_date: NaiveDate,

    /// Payment due date
    pub due_date: NaiveDate,

    /// Billing period start
    pub period_start: NaiveDate,

    /// Billing period end
    pub period_end: NaiveDate,

    /// Lifecycle status
    pub status: BillStatus,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl UtilityBill {
    /// Check if the bill total satisfies the amount invariant (> 0)
    #[inline]
    pub fn has_valid_total(&self) -> bool {
        self.total_amount > Decimal::ZERO
    }

    /// Check if the bill is in a state that permits allocation
    #[inline]
    pub fn is_allocatable(&self) -> bool {
        self.status.can_allocate()
    }
}

impl Default for UtilityBill {
    fn default() -> Self {
        let today = Utc::now().date_naive();
        Self {
            id: Uuid::new_v4(),
            property_id: Uuid::new_v4(),
            provider: String::new(),
            total_amount: Decimal::ZERO,
            split_method: SplitMethod::Equal,
            billing_date: today,
            due_date: today,
            period_start: today,
            period_end: today,
            status: BillStatus::Draft,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_parse_roundtrip() {
        for status in [
            BillStatus::Draft,
            BillStatus::Processing,
            BillStatus::ReviewRequired,
            BillStatus::Approved,
            BillStatus::Rejected,
            BillStatus::Posted,
        ] {
            assert_eq!(BillStatus::from_str(&status.to_string()), Some(status));
        }
        assert_eq!(BillStatus::from_str("DRAFT"), Some(BillStatus::Draft));
        assert_eq!(BillStatus::from_str("bogus"), None);
    }

    #[test]
    fn test_only_draft_allocates() {
        assert!(BillStatus::Draft.can_allocate());
        assert!(!BillStatus::Processing.can_allocate());
        assert!(!BillStatus::ReviewRequired.can_allocate());
        assert!(!BillStatus::Approved.can_allocate());
        assert!(!BillStatus::Rejected.can_allocate());
        assert!(!BillStatus::Posted.can_allocate());
    }

    #[test]
    fn test_transition_graph() {
        use BillStatus::*;

        assert!(Draft.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Approved));
        assert!(Processing.can_transition_to(ReviewRequired));
        assert!(ReviewRequired.can_transition_to(Approved));
        assert!(Approved.can_transition_to(Posted));

        // REJECTED from pre-POSTED states
        assert!(Draft.can_transition_to(Rejected));
        assert!(Processing.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Rejected));

        // No transitions out of POSTED
        assert!(!Posted.can_transition_to(Draft));
        assert!(!Posted.can_transition_to(Processing));
        assert!(!Posted.can_transition_to(Rejected));
        assert!(Posted.is_terminal());

        // No skipping the lifecycle
        assert!(!Draft.can_transition_to(Approved));
        assert!(!Draft.can_transition_to(Posted));
        assert!(!Processing.can_transition_to(Posted));
    }

    #[test]
    fn test_split_method_parse_roundtrip() {
        for method in [
            SplitMethod::Equal,
            SplitMethod::SquareFootage,
            SplitMethod::Occupancy,
            SplitMethod::SubMetered,
            SplitMethod::CustomRatio,
        ] {
            assert_eq!(SplitMethod::from_str(&method.to_string()), Some(method));
        }
        assert_eq!(SplitMethod::from_str("unknown"), None);
    }

    #[test]
    fn test_bill_total_invariant() {
        let bill = UtilityBill {
            total_amount: dec!(120.00),
            ..Default::default()
        };
        assert!(bill.has_valid_total());

        let zero = UtilityBill {
            total_amount: dec!(0.00),
            ..Default::default()
        };
        assert!(!zero.has_valid_total());

        let negative = UtilityBill {
            total_amount: dec!(-5.00),
            ..Default::default()
        };
        assert!(!negative.has_valid_total());
    }
}
