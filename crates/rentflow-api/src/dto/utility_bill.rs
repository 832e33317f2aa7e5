//! Utility bill DTOs
//!
//! Request and response types for bill intake, listing and allocation
//! endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use rentflow_core::models::{BillStatus, SplitMethod, UtilityAllocation, UtilityBill};
use rentflow_services::BillAllocated;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Bill creation request
///
/// Intake is thin: the bill lands in DRAFT and allocation happens later
/// through the dedicated endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUtilityBillRequest {
    /// Property the bill belongs to
    pub property_id: Uuid,

    /// Utility provider name
    #[validate(length(min = 1, max = 120, message = "Provider name is required"))]
    pub provider: String,

    /// Invoice total; must be positive
    pub total_amount: Decimal,

    /// Split algorithm for later allocation
    pub split_method: SplitMethod,

    /// Invoice date
    pub billing_date: NaiveDate,

    /// Payment due date
    pub due_date: NaiveDate,

    /// Billing period start
    pub period_start: NaiveDate,

    /// Billing period end
    pub period_end: NaiveDate,
}

impl CreateUtilityBillRequest {
    /// Structural checks validator derive can't express
    pub fn check_coherence(&self) -> Result<(), String> {
        if self.total_amount <= Decimal::ZERO {
            return Err("total_amount must be positive".to_string());
        }
        if self.period_end < self.period_start {
            return Err("period_end must not precede period_start".to_string());
        }
        if self.due_date < self.billing_date {
            return Err("due_date must not precede billing_date".to_string());
        }
        Ok(())
    }

    /// Convert to a DRAFT UtilityBill entity
    pub fn to_bill(&self) -> UtilityBill {
        let now = Utc::now();
        UtilityBill {
            id: Uuid::new_v4(),
            property_id: self.property_id,
            provider: self.provider.clone(),
            total_amount: self.total_amount,
            split_method: self.split_method,
            billing_date: self.billing_date,
            due_date: self.due_date,
            period_start: self.period_start,
            period_end: self.period_end,
            status: BillStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Filter parameters for bill listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillFilterParams {
    /// Restrict to one property
    pub property_id: Option<Uuid>,

    /// Restrict to one lifecycle status
    pub status: Option<String>,

    /// Restrict to one split method
    pub split_method: Option<String>,
}

/// Utility bill response
#[derive(Debug, Clone, Serialize)]
pub struct UtilityBillResponse {
    pub id: Uuid,
    pub property_id: Uuid,
    pub provider: String,
    pub total_amount: Decimal,
    pub split_method: String,
    pub status: String,
    pub billing_date: NaiveDate,
    pub due_date: NaiveDate,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UtilityBill> for UtilityBillResponse {
    fn from(bill: UtilityBill) -> Self {
        Self {
            id: bill.id,
            property_id: bill.property_id,
            provider: bill.provider,
            total_amount: bill.total_amount,
            split_method: bill.split_method.to_string(),
            status: bill.status.to_string(),
            billing_date: bill.billing_date,
            due_date: bill.due_date,
            period_start: bill.period_start,
            period_end: bill.period_end,
            created_at: bill.created_at,
            updated_at: bill.updated_at,
        }
    }
}

/// Persisted allocation row response
#[derive(Debug, Clone, Serialize)]
pub struct AllocationResponse {
    pub id: Uuid,
    pub bill_id: Uuid,
    pub unit_id: Uuid,
    pub amount: Decimal,
    pub percentage: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<UtilityAllocation> for AllocationResponse {
    fn from(alloc: UtilityAllocation) -> Self {
        Self {
            id: alloc.id,
            bill_id: alloc.bill_id,
            unit_id: alloc.unit_id,
            amount: alloc.amount,
            percentage: alloc.percentage,
            created_at: alloc.created_at,
        }
    }
}

/// Response for a successful allocation run
#[derive(Debug, Clone, Serialize)]
pub struct AllocateBillResponse {
    pub bill_id: Uuid,
    pub status: String,
    pub allocations: Vec<AllocationResponse>,
}

impl AllocateBillResponse {
    /// Build from the engine's outcome
    pub fn from_outcome(bill_id: Uuid, outcome: BillAllocated) -> Self {
        Self {
            bill_id,
            status: outcome.status.to_string(),
            allocations: outcome.allocations.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request() -> CreateUtilityBillRequest {
        CreateUtilityBillRequest {
            property_id: Uuid::new_v4(),
            provider: "City Power & Light".to_string(),
            total_amount: dec!(245.50),
            split_method: SplitMethod::Equal,
            billing_date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 7, 21).unwrap(),
            period_start: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
        }
    }

    #[test]
    fn test_valid_request_converts_to_draft_bill() {
        let req = request();
        assert!(req.validate().is_ok());
        assert!(req.check_coherence().is_ok());

        let bill = req.to_bill();
        assert_eq!(bill.status, BillStatus::Draft);
        assert_eq!(bill.total_amount, dec!(245.50));
        assert_eq!(bill.split_method, SplitMethod::Equal);
    }

    #[test]
    fn test_coherence_rejects_bad_amounts_and_dates() {
        let mut req = request();
        req.total_amount = dec!(0);
        assert!(req.check_coherence().is_err());

        let mut req = request();
        req.period_end = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        assert!(req.check_coherence().is_err());

        let mut req = request();
        req.due_date = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        assert!(req.check_coherence().is_err());
    }

    #[test]
    fn test_empty_provider_fails_validation() {
        let mut req = request();
        req.provider = String::new();
        assert!(req.validate().is_err());
    }
}
