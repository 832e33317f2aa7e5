//! Context hydration
//!
//! Translates a property's unit list (each with its active lease, if any)
//! into the per-unit facts each strategy needs, performing all external
//! reads up front so the strategies stay pure.
//!
//! Square footage and occupant count hydrate to `None` when absent and the
//! strategy decides whether that is fatal. Sub-metering is stricter: the
//! meter-reading batch is all-or-nothing - any lease with fewer than two
//! readings, any negative usage, or any unit without an active lease makes
//! the whole batch unusable. A partially-metered property cannot produce a
//! trustworthy allocation.

use rentflow_core::{
    models::{SplitMethod, UnitSplitContext, UnitWithLease},
    traits::MeterReadingRepository,
    AppResult,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Builds split contexts for one allocation run
pub struct ContextHydrator<M: MeterReadingRepository> {
    meter_repo: Arc<M>,
}

impl<M: MeterReadingRepository> ContextHydrator<M> {
    /// Create a new hydrator
    pub fn new(meter_repo: Arc<M>) -> Self {
        Self { meter_repo }
    }

    /// Hydrate contexts for the given split method
    ///
    /// Returns `Ok(None)` when the batch is unusable (the caller maps this
    /// to `MISSING_SPLIT_DATA`); storage failures propagate as errors.
    #[instrument(skip(self, units), fields(unit_count = units.len()))]
    pub async fn hydrate(
        &self,
        method: SplitMethod,
        units: &[UnitWithLease],
    ) -> AppResult<Option<Vec<UnitSplitContext>>> {
        let mut contexts: Vec<UnitSplitContext> = units
            .iter()
            .map(|uwl| UnitSplitContext {
                unit_id: uwl.unit.id,
                lease_id: uwl.lease_id(),
                square_footage: uwl.unit.square_footage,
                occupant_count: uwl.occupant_count(),
                usage_delta: None,
                custom_ratio: uwl.unit.custom_ratio,
            })
            .collect();

        if method == SplitMethod::SubMetered {
            match self.hydrate_usage_deltas(units).await? {
                Some(deltas) => {
                    for ctx in &mut contexts {
                        // Coverage was validated above; a lease-less unit
                        // never reaches this point
                        ctx.usage_delta = ctx.lease_id.and_then(|id| deltas.get(&id).copied());
                    }
                }
                None => return Ok(None),
            }
        }

        debug!(method = %method, "hydrated {} split contexts", contexts.len());
        Ok(Some(contexts))
    }

    /// Compute per-lease usage deltas, all-or-nothing
    ///
    /// One batched query fetches the two most recent readings for every
    /// lease in scope; the whole batch fails if any unit is vacant, any
    /// lease has fewer than two readings, or any delta is negative.
    async fn hydrate_usage_deltas(
        &self,
        units: &[UnitWithLease],
    ) -> AppResult<Option<std::collections::HashMap<Uuid, Decimal>>> {
        let mut lease_ids = Vec::with_capacity(units.len());
        for uwl in units {
            match uwl.lease_id() {
                Some(id) => lease_ids.push(id),
                None => {
                    warn!(unit_id = %uwl.unit.id, "sub-metered split requires an active lease on every unit");
                    return Ok(None);
                }
            }
        }

        let readings_by_lease = self.meter_repo.latest_two_readings(&lease_ids).await?;

        let mut deltas = std::collections::HashMap::with_capacity(lease_ids.len());
        for lease_id in &lease_ids {
            let readings = match readings_by_lease.get(lease_id) {
                Some(r) if r.len() >= 2 => r,
                _ => {
                    warn!(lease_id = %lease_id, "sub-metered split requires at least two readings per lease");
                    return Ok(None);
                }
            };

            // Readings come back newest-first
            let usage = readings[0].usage_since(&readings[1]);
            if usage < Decimal::ZERO {
                warn!(lease_id = %lease_id, %usage, "negative meter usage indicates corrupt readings");
                return Ok(None);
            }

            deltas.insert(*lease_id, usage);
        }

        Ok(Some(deltas))
    }
}
