//! Split strategies
//!
//! Five pure functions, one per split method. Each takes the hydrated
//! per-unit contexts and the bill total and returns per-unit allocation
//! amounts plus percentages, or `None` when the strategy's required input is
//! absent. `None` is the expected missing-data signal (the orchestrator maps
//! it to `MISSING_SPLIT_DATA`); strategies never panic on bad input.
//!
//! Amounts are always floored to cents, so every unit rounds the same
//! direction and the numbers stay predictable and auditable; the residual is
//! repaired afterwards by the rounding corrector.

use rentflow_core::models::{AllocationResult, SplitMethod, UnitSplitContext};
use rust_decimal::Decimal;

use crate::constants::{CENT_SCALE, HUNDRED, PERCENTAGE_SCALE, RATIO_TOLERANCE};

/// Signature shared by all split strategies
pub type SplitStrategyFn = fn(&[UnitSplitContext], Decimal) -> Option<Vec<AllocationResult>>;

/// Strategy dispatch registry
///
/// Adding a split method means adding a row here; the orchestrator's control
/// flow never enumerates strategies.
pub static STRATEGY_REGISTRY: &[(SplitMethod, SplitStrategyFn)] = &[
    (SplitMethod::Equal, split_equal),
    (SplitMethod::SquareFootage, split_square_footage),
    (SplitMethod::Occupancy, split_occupancy),
    (SplitMethod::SubMetered, split_sub_metered),
    (SplitMethod::CustomRatio, split_custom_ratio),
];

/// Look up the strategy for a split method
pub fn strategy_for(method: SplitMethod) -> Option<SplitStrategyFn> {
    STRATEGY_REGISTRY
        .iter()
        .find(|(m, _)| *m == method)
        .map(|(_, f)| *f)
}

/// Floor a money amount to whole cents
#[inline]
fn floor_to_cents(amount: Decimal) -> Decimal {
    amount.trunc_with_scale(CENT_SCALE)
}

/// Divide the total equally across all units
///
/// Defined for any non-empty unit set; percentage is 100/count for every
/// unit.
pub fn split_equal(
    contexts: &[UnitSplitContext],
    total_amount: Decimal,
) -> Option<Vec<AllocationResult>> {
    if contexts.is_empty() {
        return None;
    }

    let count = Decimal::from(contexts.len() as u64);
    let amount = floor_to_cents(total_amount / count);
    let percentage = (HUNDRED / count).round_dp(PERCENTAGE_SCALE);

    Some(
        contexts
            .iter()
            .map(|ctx| AllocationResult::new(ctx.unit_id, amount, percentage))
            .collect(),
    )
}

/// Weight each unit by its square footage
///
/// A unit without a recorded square footage contributes zero weight; the
/// strategy only fails when the total footage is zero (division by zero is
/// missing data, not a crash).
pub fn split_square_footage(
    contexts: &[UnitSplitContext],
    total_amount: Decimal,
) -> Option<Vec<AllocationResult>> {
    let weights: Vec<Decimal> = contexts
        .iter()
        .map(|ctx| ctx.square_footage.unwrap_or(Decimal::ZERO))
        .collect();

    split_by_weights(contexts, total_amount, &weights)
}

/// Weight each unit by its occupant count
///
/// A unit with a missing or zero occupant count fails the whole strategy:
/// units are never silently given a zero share of the bill.
pub fn split_occupancy(
    contexts: &[UnitSplitContext],
    total_amount: Decimal,
) -> Option<Vec<AllocationResult>> {
    let mut weights = Vec::with_capacity(contexts.len());
    for ctx in contexts {
        match ctx.occupant_count {
            Some(count) if count > 0 => weights.push(Decimal::from(count)),
            _ => return None,
        }
    }

    split_by_weights(contexts, total_amount, &weights)
}

/// Weight each unit by its metered usage delta
///
/// Requires a usage value for every unit in scope; partial metering across a
/// property is rejected outright. Fails when total usage is zero.
pub fn split_sub_metered(
    contexts: &[UnitSplitContext],
    total_amount: Decimal,
) -> Option<Vec<AllocationResult>> {
    let mut weights = Vec::with_capacity(contexts.len());
    for ctx in contexts {
        match ctx.usage_delta {
            Some(delta) if delta >= Decimal::ZERO => weights.push(delta),
            _ => return None,
        }
    }

    split_by_weights(contexts, total_amount, &weights)
}

/// Apply each unit's configured fixed ratio
///
/// Requires a ratio for every unit and requires the ratios to sum to 1.0
/// within `RATIO_TOLERANCE`.
pub fn split_custom_ratio(
    contexts: &[UnitSplitContext],
    total_amount: Decimal,
) -> Option<Vec<AllocationResult>> {
    if contexts.is_empty() {
        return None;
    }

    let mut ratios = Vec::with_capacity(contexts.len());
    for ctx in contexts {
        ratios.push(ctx.custom_ratio?);
    }

    let ratio_sum: Decimal = ratios.iter().copied().sum();
    if (ratio_sum - Decimal::ONE).abs() > RATIO_TOLERANCE {
        return None;
    }

    Some(
        contexts
            .iter()
            .zip(ratios)
            .map(|(ctx, ratio)| {
                AllocationResult::new(
                    ctx.unit_id,
                    floor_to_cents(ratio * total_amount),
                    (ratio * HUNDRED).round_dp(PERCENTAGE_SCALE),
                )
            })
            .collect(),
    )
}

/// Shared proportional split: amount_i = floor(w_i / sum(w) × total)
fn split_by_weights(
    contexts: &[UnitSplitContext],
    total_amount: Decimal,
    weights: &[Decimal],
) -> Option<Vec<AllocationResult>> {
    let weight_sum: Decimal = weights.iter().copied().sum();
    if weight_sum <= Decimal::ZERO {
        return None;
    }

    Some(
        contexts
            .iter()
            .zip(weights)
            .map(|(ctx, weight)| {
                let fraction = weight / weight_sum;
                AllocationResult::new(
                    ctx.unit_id,
                    floor_to_cents(fraction * total_amount),
                    (fraction * HUNDRED).round_dp(PERCENTAGE_SCALE),
                )
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn ctx() -> UnitSplitContext {
        UnitSplitContext::new(Uuid::new_v4())
    }

    fn percentage_sum(results: &[AllocationResult]) -> Decimal {
        results.iter().map(|r| r.percentage).sum()
    }

    #[test]
    fn test_registry_covers_all_methods() {
        for method in [
            SplitMethod::Equal,
            SplitMethod::SquareFootage,
            SplitMethod::Occupancy,
            SplitMethod::SubMetered,
            SplitMethod::CustomRatio,
        ] {
            assert!(strategy_for(method).is_some(), "no strategy for {method}");
        }
    }

    #[test]
    fn test_equal_split_three_units() {
        let contexts = vec![ctx(), ctx(), ctx()];
        let results = split_equal(&contexts, dec!(100.00)).unwrap();

        assert_eq!(results.len(), 3);
        for r in &results {
            // Floored to cents, never rounded up
            assert_eq!(r.amount, dec!(33.33));
            assert_eq!(r.percentage, dec!(33.3333));
        }
    }

    #[test]
    fn test_equal_split_single_unit() {
        let contexts = vec![ctx()];
        let results = split_equal(&contexts, dec!(250.00)).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].amount, dec!(250.00));
        assert_eq!(results[0].percentage, dec!(100));
    }

    #[test]
    fn test_equal_split_empty_contexts() {
        assert!(split_equal(&[], dec!(100.00)).is_none());
    }

    #[test]
    fn test_square_footage_proportional() {
        let mut a = ctx();
        a.square_footage = Some(dec!(600));
        let mut b = ctx();
        b.square_footage = Some(dec!(400));

        let results = split_square_footage(&[a, b], dec!(200.00)).unwrap();
        assert_eq!(results[0].amount, dec!(120.00));
        assert_eq!(results[0].percentage, dec!(60));
        assert_eq!(results[1].amount, dec!(80.00));
        assert_eq!(results[1].percentage, dec!(40));
    }

    #[test]
    fn test_square_footage_missing_contributes_zero() {
        let mut a = ctx();
        a.square_footage = Some(dec!(500));
        let b = ctx(); // no square footage recorded

        let results = split_square_footage(&[a, b], dec!(100.00)).unwrap();
        assert_eq!(results[0].amount, dec!(100.00));
        assert_eq!(results[1].amount, dec!(0.00));
    }

    #[test]
    fn test_square_footage_zero_sum_is_missing_data() {
        let contexts = vec![ctx(), ctx()];
        assert!(split_square_footage(&contexts, dec!(100.00)).is_none());
    }

    #[test]
    fn test_occupancy_proportional() {
        let mut a = ctx();
        a.occupant_count = Some(3);
        let mut b = ctx();
        b.occupant_count = Some(1);

        let results = split_occupancy(&[a, b], dec!(80.00)).unwrap();
        assert_eq!(results[0].amount, dec!(60.00));
        assert_eq!(results[0].percentage, dec!(75));
        assert_eq!(results[1].amount, dec!(20.00));
        assert_eq!(results[1].percentage, dec!(25));
    }

    #[test]
    fn test_occupancy_zero_occupants_fails_whole_split() {
        let mut a = ctx();
        a.occupant_count = Some(2);
        let mut b = ctx();
        b.occupant_count = Some(0);

        // One zero-occupant unit fails everything; the unit is not dropped
        assert!(split_occupancy(&[a, b], dec!(80.00)).is_none());
    }

    #[test]
    fn test_occupancy_all_zero_fails() {
        let mut a = ctx();
        a.occupant_count = Some(0);
        let mut b = ctx();
        b.occupant_count = Some(0);

        assert!(split_occupancy(&[a, b], dec!(80.00)).is_none());
    }

    #[test]
    fn test_occupancy_missing_count_fails() {
        let mut a = ctx();
        a.occupant_count = Some(2);
        let b = ctx(); // occupant count unknown

        assert!(split_occupancy(&[a, b], dec!(80.00)).is_none());
    }

    #[test]
    fn test_sub_metered_proportional_with_flooring() {
        let mut a = ctx();
        a.usage_delta = Some(dec!(150.0));
        let mut b = ctx();
        b.usage_delta = Some(dec!(50.0));
        let mut c = ctx();
        c.usage_delta = Some(dec!(100.0));

        let results = split_sub_metered(&[a, b, c], dec!(90.00)).unwrap();
        assert_eq!(results[0].amount, dec!(45.00));
        assert_eq!(results[1].amount, dec!(15.00));
        assert_eq!(results[2].amount, dec!(30.00));
        assert_eq!(percentage_sum(&results), dec!(100));
    }

    #[test]
    fn test_sub_metered_missing_delta_fails() {
        let mut a = ctx();
        a.usage_delta = Some(dec!(10));
        let b = ctx();

        assert!(split_sub_metered(&[a, b], dec!(50.00)).is_none());
    }

    #[test]
    fn test_sub_metered_negative_delta_fails() {
        let mut a = ctx();
        a.usage_delta = Some(dec!(10));
        let mut b = ctx();
        b.usage_delta = Some(dec!(-3));

        assert!(split_sub_metered(&[a, b], dec!(50.00)).is_none());
    }

    #[test]
    fn test_sub_metered_zero_usage_fails() {
        let mut a = ctx();
        a.usage_delta = Some(dec!(0));
        let mut b = ctx();
        b.usage_delta = Some(dec!(0));

        assert!(split_sub_metered(&[a, b], dec!(50.00)).is_none());
    }

    #[test]
    fn test_custom_ratio_split() {
        let mut a = ctx();
        a.custom_ratio = Some(dec!(0.7));
        let mut b = ctx();
        b.custom_ratio = Some(dec!(0.3));

        let results = split_custom_ratio(&[a, b], dec!(100.00)).unwrap();
        assert_eq!(results[0].amount, dec!(70.00));
        assert_eq!(results[0].percentage, dec!(70));
        assert_eq!(results[1].amount, dec!(30.00));
        assert_eq!(results[1].percentage, dec!(30));
    }

    #[test]
    fn test_custom_ratio_outside_tolerance_fails() {
        let mut a = ctx();
        a.custom_ratio = Some(dec!(0.66));
        let mut b = ctx();
        b.custom_ratio = Some(dec!(0.33));

        // 0.99 is 0.01 away from 1.0 - well outside tolerance
        assert!(split_custom_ratio(&[a, b], dec!(100.00)).is_none());
    }

    #[test]
    fn test_custom_ratio_within_tolerance_succeeds() {
        let mut a = ctx();
        a.custom_ratio = Some(dec!(0.50001));
        let mut b = ctx();
        b.custom_ratio = Some(dec!(0.5));

        // Sum 1.00001 is within the 0.0001 tolerance
        assert!(split_custom_ratio(&[a, b], dec!(100.00)).is_some());
    }

    #[test]
    fn test_custom_ratio_missing_ratio_fails() {
        let mut a = ctx();
        a.custom_ratio = Some(dec!(1.0));
        let b = ctx();

        assert!(split_custom_ratio(&[a, b], dec!(100.00)).is_none());
    }

    #[test]
    fn test_percentages_sum_to_hundred_within_tolerance() {
        let mut a = ctx();
        a.square_footage = Some(dec!(333));
        let mut b = ctx();
        b.square_footage = Some(dec!(333));
        let mut c = ctx();
        c.square_footage = Some(dec!(334));

        let results = split_square_footage(&[a, b, c], dec!(100.00)).unwrap();
        let sum = percentage_sum(&results);
        assert!((sum - dec!(100)).abs() <= dec!(0.01), "sum was {sum}");
    }

    #[test]
    fn test_amounts_never_exceed_total() {
        // Flooring means the raw sum is always <= total
        let contexts: Vec<UnitSplitContext> = (0..7).map(|_| ctx()).collect();
        let results = split_equal(&contexts, dec!(99.99)).unwrap();
        let sum: Decimal = results.iter().map(|r| r.amount).sum();
        assert!(sum <= dec!(99.99));
    }
}
