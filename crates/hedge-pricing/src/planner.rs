//! Snapshot-to-decision pipeline.

use hedge_core::VenueSnapshot;
use tracing::debug;

use crate::config::PricingConfig;
use crate::cost::{CostModel, CostedQuote};
use crate::error::PricingResult;
use crate::fill::simulate_snapshot_fill;
use crate::selector::{select_venue, HedgeDecision};

/// Every quote of a planning pass plus the decision built from the winner.
#[derive(Debug, Clone)]
pub struct HedgePlan {
    pub decision: HedgeDecision,
    pub quotes: Vec<CostedQuote>,
}

/// Turns snapshots into a hedge decision.
#[derive(Debug, Clone)]
pub struct HedgePlanner {
    config: PricingConfig,
    model: CostModel,
}

impl HedgePlanner {
    pub fn new(config: PricingConfig) -> Self {
        let model = CostModel::new(config.policy, config.direction, config.horizon_days);
        Self { config, model }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Simulate and cost every snapshot, in input order.
    pub fn quote_all(&self, snapshots: &[VenueSnapshot]) -> Vec<CostedQuote> {
        let target = self.config.target();
        snapshots
            .iter()
            .map(|snapshot| {
                let fill = simulate_snapshot_fill(snapshot, self.config.fill_side, target);
                let quote = self.model.quote(snapshot, &fill);
                debug!(
                    venue = %quote.venue,
                    symbol = %quote.symbol,
                    base_cost = %quote.base_cost,
                    adjusted_cost = %quote.adjusted_cost,
                    feasible = quote.feasible,
                    "Quote"
                );
                quote
            })
            .collect()
    }

    /// Quote all snapshots and select the cheapest venue.
    ///
    /// Fails with `NoViableVenue` when there are no snapshots.
    pub fn plan(&self, snapshots: &[VenueSnapshot]) -> PricingResult<HedgePlan> {
        let quotes = self.quote_all(snapshots);
        let best = select_venue(&quotes)?;
        let decision = HedgeDecision::from_quote(
            best,
            self.config.target(),
            self.config.direction,
            self.config.horizon_days,
        );
        Ok(HedgePlan { decision, quotes })
    }
}
