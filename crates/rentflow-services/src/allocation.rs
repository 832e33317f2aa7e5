//! Allocation orchestrator
//!
//! The single entry point for allocating a utility bill across a property's
//! units. Validates bill state, loads units, hydrates contexts, dispatches
//! to the registered strategy, applies rounding correction, validates the
//! sum invariant, and persists allocations plus the DRAFT -> PROCESSING
//! transition in one atomic unit. Every failure path leaves the bill and
//! any prior allocation state completely unchanged.

use rentflow_core::{
    config::AllocationConfig,
    models::{BillStatus, SplitMethod, UtilityAllocation},
    traits::{BillRepository, MeterReadingRepository, UnitRepository},
    AllocationError, AppError,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::hydrator::ContextHydrator;
use crate::rounding::{allocated_sum, allocations_balance, correct_rounding};
use crate::strategies::strategy_for;

/// Successful allocation outcome
#[derive(Debug, Clone)]
pub struct BillAllocated {
    /// The persisted allocation rows, in unit iteration order
    pub allocations: Vec<UtilityAllocation>,
    /// The bill's new status (always PROCESSING)
    pub status: BillStatus,
}

/// Allocation engine
///
/// Owns its repositories as explicit dependencies (no process-wide
/// singletons) and is wrapped in Arc for sharing across async tasks.
pub struct AllocationEngine<B, U, M>
where
    B: BillRepository,
    U: UnitRepository,
    M: MeterReadingRepository,
{
    bill_repo: Arc<B>,
    unit_repo: Arc<U>,
    hydrator: ContextHydrator<M>,
    config: AllocationConfig,
}

impl<B, U, M> AllocationEngine<B, U, M>
where
    B: BillRepository,
    U: UnitRepository,
    M: MeterReadingRepository,
{
    /// Create a new allocation engine with default tuning
    pub fn new(bill_repo: Arc<B>, unit_repo: Arc<U>, meter_repo: Arc<M>) -> Self {
        Self::with_config(bill_repo, unit_repo, meter_repo, AllocationConfig::default())
    }

    /// Create a new allocation engine with explicit tuning
    ///
    /// The config bounds the persist transaction (`transaction_timeout_secs`)
    /// and fixes the decimal places kept on stored percentages
    /// (`percentage_scale`).
    pub fn with_config(
        bill_repo: Arc<B>,
        unit_repo: Arc<U>,
        meter_repo: Arc<M>,
        config: AllocationConfig,
    ) -> Self {
        Self {
            bill_repo,
            unit_repo,
            hydrator: ContextHydrator::new(meter_repo),
            config,
        }
    }

    /// Allocate a utility bill across its property's units
    ///
    /// One-shot per bill: re-allocation of an already-allocated bill is
    /// rejected, and only DRAFT bills may be allocated. On success the bill
    /// is PROCESSING and the returned allocations sum to the bill total
    /// exactly.
    #[instrument(skip(self))]
    pub async fn allocate_bill(&self, bill_id: Uuid) -> Result<BillAllocated, AllocationError> {
        let bill = self
            .bill_repo
            .find_by_id(bill_id)
            .await?
            .ok_or(AllocationError::BillNotFound(bill_id))?;

        // POSTED is immutable - asserted unconditionally, before any other
        // validation
        if bill.status == BillStatus::Posted {
            warn!(bill_id = %bill_id, "allocation attempted on a posted bill");
            return Err(AllocationError::InvalidStatus(BillStatus::Posted));
        }

        if !bill.status.can_allocate() {
            return Err(AllocationError::InvalidStatus(bill.status));
        }

        if self.bill_repo.count_allocations(bill_id).await? > 0 {
            return Err(AllocationError::AlreadyAllocated(bill_id));
        }

        // Amount invariant, checked before any unit data is loaded
        if !bill.has_valid_total() {
            return Err(AllocationError::InvalidAmount(bill.total_amount));
        }

        let units = self
            .unit_repo
            .units_with_active_lease(bill.property_id)
            .await?;
        if units.is_empty() {
            return Err(AllocationError::NoUnitsFound(bill.property_id));
        }

        // Ratio intake is not wired up; reject explicitly rather than
        // defaulting silently. The pure strategy stays implemented and
        // tested for when the input mechanism lands.
        if bill.split_method == SplitMethod::CustomRatio {
            return Err(AllocationError::MissingSplitData(
                "custom ratio input is not available for this bill".to_string(),
            ));
        }

        let contexts = self
            .hydrator
            .hydrate(bill.split_method, &units)
            .await?
            .ok_or_else(|| {
                AllocationError::MissingSplitData(format!(
                    "required data for {} split is incomplete",
                    bill.split_method
                ))
            })?;

        let strategy = strategy_for(bill.split_method).ok_or_else(|| {
            AllocationError::MissingSplitData(format!(
                "no strategy registered for {} split",
                bill.split_method
            ))
        })?;

        let raw = strategy(&contexts, bill.total_amount).ok_or_else(|| {
            AllocationError::MissingSplitData(format!(
                "{} split cannot be computed from the available data",
                bill.split_method
            ))
        })?;

        let mut corrected = correct_rounding(raw, bill.total_amount);

        // Stored percentages carry the configured scale
        for result in &mut corrected {
            result.percentage = result.percentage.round_dp(self.config.percentage_scale);
        }

        // Mandatory defensive check: an un-balanced allocation is never
        // persisted
        if !allocations_balance(&corrected, bill.total_amount) {
            return Err(AllocationError::SumMismatch {
                expected: bill.total_amount,
                actual: allocated_sum(&corrected),
            });
        }

        // Bound the persist transaction so a stuck row lock cannot pin the
        // request indefinitely; the transaction itself rolls back on drop.
        let allocations = timeout(
            Duration::from_secs(self.config.transaction_timeout_secs),
            self.bill_repo.persist_allocation(bill_id, &corrected),
        )
        .await
        .map_err(|_| {
            warn!(bill_id = %bill_id, "allocation persist timed out");
            AppError::Transaction(format!(
                "allocation persist exceeded {}s",
                self.config.transaction_timeout_secs
            ))
        })??;

        info!(
            bill_id = %bill_id,
            method = %bill.split_method,
            units = allocations.len(),
            total = %bill.total_amount,
            "bill allocated"
        );

        Ok(BillAllocated {
            allocations,
            status: BillStatus::Processing,
        })
    }
}
