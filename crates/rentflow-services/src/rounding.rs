//! Rounding correction
//!
//! Strategies floor every per-unit amount to whole cents, so the raw sum can
//! fall short of the bill total by a few cents. The corrector pushes the
//! residual onto the LAST allocation (unit iteration order is stable, so the
//! absorbing unit is reproducible), after which the sum of amounts equals
//! the total exactly. This is the single most important correctness property
//! of the engine and is tested here independently of any strategy.

use rentflow_core::models::AllocationResult;
use rust_decimal::Decimal;
use tracing::debug;

use crate::constants::{CENT_SCALE, ONE_CENT};

/// Sum of allocated amounts
pub fn allocated_sum(results: &[AllocationResult]) -> Decimal {
    results.iter().map(|r| r.amount).sum()
}

/// Check that allocations sum to the total, cent-exact
pub fn allocations_balance(results: &[AllocationResult], total_amount: Decimal) -> bool {
    allocated_sum(results).round_dp(CENT_SCALE) == total_amount.round_dp(CENT_SCALE)
}

/// Push any residual cent difference onto the last allocation
///
/// `diff = round(total - sum(raw), 2)`; a difference below one cent is left
/// alone. After correction, `sum(amounts) == total` exactly.
pub fn correct_rounding(
    mut results: Vec<AllocationResult>,
    total_amount: Decimal,
) -> Vec<AllocationResult> {
    let diff = (total_amount - allocated_sum(&results)).round_dp(CENT_SCALE);

    if diff.abs() < ONE_CENT {
        return results;
    }

    if let Some(last) = results.last_mut() {
        debug!(%diff, unit_id = %last.unit_id, "applying rounding correction to last allocation");
        last.amount += diff;
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn result(amount: Decimal) -> AllocationResult {
        AllocationResult::new(Uuid::new_v4(), amount, dec!(0))
    }

    #[test]
    fn test_exact_sum_left_unchanged() {
        let results = vec![result(dec!(60.00)), result(dec!(40.00))];
        let corrected = correct_rounding(results.clone(), dec!(100.00));
        assert_eq!(corrected, results);
    }

    #[test]
    fn test_one_cent_shortfall_goes_to_last() {
        // 100.00 over three equal floors of 33.33
        let results = vec![
            result(dec!(33.33)),
            result(dec!(33.33)),
            result(dec!(33.33)),
        ];
        let corrected = correct_rounding(results, dec!(100.00));

        assert_eq!(corrected[0].amount, dec!(33.33));
        assert_eq!(corrected[1].amount, dec!(33.33));
        assert_eq!(corrected[2].amount, dec!(33.34));
        assert!(allocations_balance(&corrected, dec!(100.00)));
    }

    #[test]
    fn test_multi_cent_shortfall() {
        let results = vec![
            result(dec!(14.28)),
            result(dec!(14.28)),
            result(dec!(14.28)),
            result(dec!(14.28)),
            result(dec!(14.28)),
            result(dec!(14.28)),
            result(dec!(14.28)),
        ];
        // 7 x 14.28 = 99.96; four cents short of 100.00
        let corrected = correct_rounding(results, dec!(100.00));
        assert_eq!(corrected[6].amount, dec!(14.32));
        assert!(allocations_balance(&corrected, dec!(100.00)));
    }

    #[test]
    fn test_overshoot_subtracts_from_last() {
        let results = vec![result(dec!(50.01)), result(dec!(50.01))];
        let corrected = correct_rounding(results, dec!(100.00));
        assert_eq!(corrected[0].amount, dec!(50.01));
        assert_eq!(corrected[1].amount, dec!(49.99));
        assert!(allocations_balance(&corrected, dec!(100.00)));
    }

    #[test]
    fn test_sub_cent_difference_ignored() {
        // Totals carrying sub-cent precision are left as-is
        let results = vec![result(dec!(33.33)), result(dec!(66.67))];
        let corrected = correct_rounding(results.clone(), dec!(100.004));
        assert_eq!(corrected, results);
    }

    #[test]
    fn test_single_allocation_absorbs_everything() {
        let results = vec![result(dec!(99.97))];
        let corrected = correct_rounding(results, dec!(100.00));
        assert_eq!(corrected[0].amount, dec!(100.00));
    }

    #[test]
    fn test_balance_check_detects_mismatch() {
        let results = vec![result(dec!(33.33)), result(dec!(33.33))];
        assert!(!allocations_balance(&results, dec!(100.00)));
        assert!(allocations_balance(&results, dec!(66.66)));
    }

    #[test]
    fn test_correction_is_cent_exact_across_totals() {
        // Sweep several awkward totals over several unit counts
        for (total, count) in [
            (dec!(100.00), 3usize),
            (dec!(0.05), 3),
            (dec!(17.77), 6),
            (dec!(999.99), 7),
            (dec!(1.00), 9),
        ] {
            let count_dec = Decimal::from(count as u64);
            let floored = (total / count_dec).trunc_with_scale(2);
            let results: Vec<AllocationResult> = (0..count).map(|_| result(floored)).collect();

            let corrected = correct_rounding(results, total);
            assert!(
                allocations_balance(&corrected, total),
                "total {total} over {count} units did not balance"
            );
        }
    }
}
