//! Fee and funding adjustment of simulated fills.
//!
//! Rules, applied in order to the base fill cost:
//!
//! 1. taker fee: `cost *= 1 + horizon_days * fee_events_per_day * (±fee)`,
//!    with `+` for long and `-` for short exposure
//! 2. funding: `cost *= 1 + funding_periods * funding_rate`
//!
//! A missing input skips its step and records a warning; the venue stays
//! eligible. Infeasible fills keep [`INFEASIBLE_COST`].

use std::fmt;

use hedge_core::{HedgeDirection, Price, Size, VenueId, VenueSnapshot};
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::CostPolicy;
use crate::fill::{FillResult, INFEASIBLE_COST};

/// Non-fatal condition attached to a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteWarning {
    /// The book could not cover the target volume.
    InsufficientLiquidity { shortfall: Size },
    /// No taker fee known; fee step skipped.
    MissingFee,
    /// No funding rate available; funding step skipped.
    MissingFunding,
}

impl fmt::Display for QuoteWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientLiquidity { shortfall } => {
                write!(f, "insufficient liquidity (shortfall {shortfall})")
            }
            Self::MissingFee => write!(f, "taker fee unknown"),
            Self::MissingFunding => write!(f, "funding rate unavailable"),
        }
    }
}

/// A venue's simulated, cost-adjusted price for the hedge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostedQuote {
    pub venue: VenueId,
    pub symbol: String,
    /// Fill cost before adjustments.
    pub base_cost: Decimal,
    /// Fill cost after fee and funding adjustments.
    pub adjusted_cost: Decimal,
    pub limit_price: Option<Price>,
    pub filled: Size,
    pub feasible: bool,
    /// Taker fee used (if any).
    pub taker_fee: Option<Decimal>,
    /// Funding rate used (if any).
    pub funding_rate: Option<Decimal>,
    pub warnings: Vec<QuoteWarning>,
}

/// Cost model for one planning pass.
#[derive(Debug, Clone, Copy)]
pub struct CostModel {
    policy: CostPolicy,
    direction: HedgeDirection,
    horizon_days: Decimal,
}

impl CostModel {
    pub fn new(policy: CostPolicy, direction: HedgeDirection, horizon_days: Decimal) -> Self {
        Self {
            policy,
            direction,
            horizon_days,
        }
    }

    /// Apply the fee step. `None` on overflow.
    pub fn apply_fee(&self, cost: Decimal, fee: Decimal) -> Option<Decimal> {
        let signed_fee = match self.direction {
            HedgeDirection::Long => fee,
            HedgeDirection::Short => -fee,
        };
        let factor = self
            .horizon_days
            .checked_mul(self.policy.fee_events_per_day)?
            .checked_mul(signed_fee)?
            .checked_add(Decimal::ONE)?;
        cost.checked_mul(factor)
    }

    /// Apply the funding step. `None` on overflow.
    pub fn apply_funding(&self, cost: Decimal, funding_rate: Decimal) -> Option<Decimal> {
        let factor = self
            .policy
            .funding_periods
            .checked_mul(funding_rate)?
            .checked_add(Decimal::ONE)?;
        cost.checked_mul(factor)
    }

    /// Adjust `base_cost` for the given inputs.
    ///
    /// Returns the adjusted cost and the warnings for missing inputs.
    /// [`INFEASIBLE_COST`] is returned unchanged; overflow yields it.
    pub fn adjust(
        &self,
        base_cost: Decimal,
        taker_fee: Option<Decimal>,
        funding_rate: Option<Decimal>,
    ) -> (Decimal, Vec<QuoteWarning>) {
        let mut warnings = Vec::new();
        if taker_fee.is_none() {
            warnings.push(QuoteWarning::MissingFee);
        }
        if funding_rate.is_none() {
            warnings.push(QuoteWarning::MissingFunding);
        }
        if base_cost == INFEASIBLE_COST {
            return (INFEASIBLE_COST, warnings);
        }

        let adjusted = Some(base_cost)
            .and_then(|cost| match taker_fee {
                Some(fee) => self.apply_fee(cost, fee),
                None => Some(cost),
            })
            .and_then(|cost| match funding_rate {
                Some(rate) => self.apply_funding(cost, rate),
                None => Some(cost),
            })
            .unwrap_or(INFEASIBLE_COST);

        (adjusted, warnings)
    }

    /// Build the costed quote for a snapshot and its simulated fill.
    pub fn quote(&self, snapshot: &VenueSnapshot, fill: &FillResult) -> CostedQuote {
        let (adjusted_cost, mut warnings) =
            self.adjust(fill.cost, snapshot.taker_fee, snapshot.funding_rate);
        if !fill.feasible {
            warnings.insert(
                0,
                QuoteWarning::InsufficientLiquidity {
                    shortfall: fill.shortfall(),
                },
            );
        }

        for warning in &warnings {
            debug!(
                venue = %snapshot.venue,
                symbol = %snapshot.symbol,
                reason = %warning,
                "Quote warning"
            );
        }

        CostedQuote {
            venue: snapshot.venue.clone(),
            symbol: snapshot.symbol.clone(),
            base_cost: fill.cost,
            adjusted_cost,
            limit_price: fill.limit_price,
            filled: fill.filled,
            feasible: fill.feasible,
            taker_fee: snapshot.taker_fee,
            funding_rate: snapshot.funding_rate,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fill::simulate_fill;
    use hedge_core::{OrderBook, OrderSide};
    use rust_decimal_macros::dec;

    fn model(direction: HedgeDirection) -> CostModel {
        CostModel::new(CostPolicy::default(), direction, dec!(2))
    }

    #[test]
    fn test_short_fee_reduces_cost() {
        // 900 * (1 + 2 * 3 * -0.001)
        let (cost, warnings) = model(HedgeDirection::Short).adjust(dec!(900), Some(dec!(0.001)), Some(dec!(0)));
        assert_eq!(cost, dec!(894.6));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_long_fee_increases_cost() {
        let (cost, _) = model(HedgeDirection::Long).adjust(dec!(900), Some(dec!(0.001)), Some(dec!(0)));
        assert_eq!(cost, dec!(905.4));
    }

    #[test]
    fn test_missing_fee_skips_step() {
        let (cost, warnings) = model(HedgeDirection::Short).adjust(dec!(900), None, Some(dec!(0)));
        assert_eq!(cost, dec!(900));
        assert_eq!(warnings, vec![QuoteWarning::MissingFee]);
    }

    #[test]
    fn test_funding_is_single_period() {
        let (cost, _) = model(HedgeDirection::Short).adjust(dec!(1000), None, Some(dec!(0.0001)));
        assert_eq!(cost, dec!(1000.1));

        let policy = CostPolicy {
            funding_periods: dec!(3),
            ..CostPolicy::default()
        };
        let model = CostModel::new(policy, HedgeDirection::Short, dec!(2));
        let (cost, _) = model.adjust(dec!(1000), None, Some(dec!(0.0001)));
        assert_eq!(cost, dec!(1000.3));
    }

    #[test]
    fn test_missing_funding_skips_step() {
        let (cost, warnings) = model(HedgeDirection::Short).adjust(dec!(1000), Some(dec!(0)), None);
        assert_eq!(cost, dec!(1000));
        assert_eq!(warnings, vec![QuoteWarning::MissingFunding]);
    }

    #[test]
    fn test_sentinel_is_not_adjusted() {
        let (cost, warnings) = model(HedgeDirection::Long).adjust(INFEASIBLE_COST, Some(dec!(0.001)), None);
        assert_eq!(cost, INFEASIBLE_COST);
        assert_eq!(warnings, vec![QuoteWarning::MissingFunding]);
    }

    #[test]
    fn test_overflow_yields_sentinel() {
        let big = Decimal::MAX - dec!(1);
        let (cost, _) = model(HedgeDirection::Long).adjust(big, Some(dec!(0.01)), None);
        assert_eq!(cost, INFEASIBLE_COST);
    }

    #[test]
    fn test_quote_records_inputs_and_shortfall() {
        let snapshot = VenueSnapshot::new(
            VenueId::new("v"),
            "ETHUSDT",
            OrderBook::from_pairs(&[], &[[dec!(100), dec!(2)]]),
            None,
            Some(dec!(0.0005)),
        );
        let fill = simulate_fill(snapshot.levels_for(OrderSide::Buy), Size::new(dec!(5)));
        let quote = model(HedgeDirection::Short).quote(&snapshot, &fill);

        assert!(!quote.feasible);
        assert_eq!(quote.adjusted_cost, INFEASIBLE_COST);
        assert_eq!(quote.taker_fee, Some(dec!(0.0005)));
        assert_eq!(
            quote.warnings,
            vec![
                QuoteWarning::InsufficientLiquidity {
                    shortfall: Size::new(dec!(3))
                },
                QuoteWarning::MissingFunding,
            ]
        );
    }
}
