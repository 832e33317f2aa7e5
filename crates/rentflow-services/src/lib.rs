//! Utility bill allocation engine for RentFlow
//!
//! This crate partitions a utility bill's total across a property's units
//! and performs the bill's DRAFT -> PROCESSING transition.
//!
//! # Architecture
//!
//! The pipeline is: orchestrator -> hydrator (external reads) -> strategy
//! (pure math) -> rounding corrector -> sum validator -> atomic persistence.
//!
//! - `AllocationEngine` - the orchestrator and single entry point; takes its
//!   repositories as explicit dependencies and is wrapped in Arc for sharing
//!   across async tasks
//! - `ContextHydrator` - builds per-unit split contexts, including the
//!   all-or-nothing meter-reading batch for sub-metered splits
//! - `strategies` - the five pure split functions plus the dispatch registry
//! - `rounding` - the cent-level correction that makes allocations sum to
//!   the bill total exactly
//!
//! All operations are instrumented with tracing; expected failures are the
//! closed `AllocationError` taxonomy from rentflow-core.

pub mod allocation;
pub mod hydrator;
pub mod rounding;
pub mod strategies;

pub use allocation::{AllocationEngine, BillAllocated};
pub use hydrator::ContextHydrator;

/// Allocation math constants
pub mod constants {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    /// Smallest representable money step
    pub const ONE_CENT: Decimal = dec!(0.01);

    /// One hundred percent
    pub const HUNDRED: Decimal = dec!(100);

    /// Tolerance for custom-ratio sums around 1.0
    pub const RATIO_TOLERANCE: Decimal = dec!(0.0001);

    /// Decimal places kept on money amounts
    pub const CENT_SCALE: u32 = 2;

    /// Working precision for percentage math inside the pure strategies;
    /// the stored scale comes from `AllocationConfig` and is applied by the
    /// engine before persistence
    pub const PERCENTAGE_SCALE: u32 = 4;
}
