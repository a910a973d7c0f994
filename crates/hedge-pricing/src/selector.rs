//! Venue selection and the resulting hedge decision.

use chrono::{DateTime, Utc};
use hedge_core::{HedgeDirection, OrderSide, Price, Size, VenueId};
use rust_decimal::Decimal;
use tracing::info;

use crate::cost::CostedQuote;
use crate::error::{PricingError, PricingResult};

/// Pick the quote with the minimum adjusted cost.
///
/// Infeasible quotes take part (their cost sorts last). Equal costs resolve
/// to the quote encountered first.
pub fn select_venue(quotes: &[CostedQuote]) -> PricingResult<&CostedQuote> {
    quotes
        .iter()
        .reduce(|best, quote| {
            if quote.adjusted_cost < best.adjusted_cost {
                quote
            } else {
                best
            }
        })
        .ok_or(PricingError::NoViableVenue)
}

/// Where and how to hedge, fixed for the rest of the cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HedgeDecision {
    venue: VenueId,
    symbol: String,
    amount: Size,
    direction: HedgeDirection,
    limit_price: Option<Price>,
    adjusted_cost: Decimal,
    horizon_days: Decimal,
    feasible: bool,
    decided_at: DateTime<Utc>,
}

impl HedgeDecision {
    /// Build a decision from the winning quote.
    pub fn from_quote(
        quote: &CostedQuote,
        amount: Size,
        direction: HedgeDirection,
        horizon_days: Decimal,
    ) -> Self {
        let decision = Self {
            venue: quote.venue.clone(),
            symbol: quote.symbol.clone(),
            amount,
            direction,
            limit_price: quote.limit_price,
            adjusted_cost: quote.adjusted_cost,
            horizon_days,
            feasible: quote.feasible,
            decided_at: Utc::now(),
        };
        info!(
            venue = %decision.venue,
            symbol = %decision.symbol,
            %amount,
            %direction,
            limit_price = ?decision.limit_price.map(|p| p.to_string()),
            adjusted_cost = %decision.adjusted_cost,
            feasible = decision.feasible,
            "Hedge decision"
        );
        decision
    }

    #[must_use]
    pub fn venue(&self) -> &VenueId {
        &self.venue
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    #[must_use]
    pub fn amount(&self) -> Size {
        self.amount
    }

    #[must_use]
    pub fn direction(&self) -> HedgeDirection {
        self.direction
    }

    /// Side of the hedge order.
    #[must_use]
    pub fn order_side(&self) -> OrderSide {
        self.direction.order_side()
    }

    /// Price of the last level the simulated fill touched.
    #[must_use]
    pub fn limit_price(&self) -> Option<Price> {
        self.limit_price
    }

    #[must_use]
    pub fn adjusted_cost(&self) -> Decimal {
        self.adjusted_cost
    }

    #[must_use]
    pub fn horizon_days(&self) -> Decimal {
        self.horizon_days
    }

    #[must_use]
    pub fn is_feasible(&self) -> bool {
        self.feasible
    }

    #[must_use]
    pub fn decided_at(&self) -> DateTime<Utc> {
        self.decided_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fill::INFEASIBLE_COST;
    use rust_decimal_macros::dec;

    fn quote(venue: &str, cost: Decimal) -> CostedQuote {
        CostedQuote {
            venue: VenueId::new(venue),
            symbol: "ETHUSDT".to_string(),
            base_cost: cost,
            adjusted_cost: cost,
            limit_price: Some(Price::new(dec!(100))),
            filled: Size::new(dec!(1)),
            feasible: cost != INFEASIBLE_COST,
            taker_fee: None,
            funding_rate: None,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_selects_minimum() {
        let quotes = vec![quote("a", dec!(1000)), quote("b", dec!(894.6)), quote("c", dec!(950))];
        assert_eq!(select_venue(&quotes).unwrap().venue.as_str(), "b");
    }

    #[test]
    fn test_tie_resolves_to_first() {
        let quotes = vec![quote("a", dec!(950)), quote("b", dec!(900)), quote("c", dec!(900))];
        assert_eq!(select_venue(&quotes).unwrap().venue.as_str(), "b");
    }

    #[test]
    fn test_empty_is_no_viable_venue() {
        assert!(matches!(select_venue(&[]), Err(PricingError::NoViableVenue)));
    }

    #[test]
    fn test_all_infeasible_still_selects() {
        let quotes = vec![quote("a", INFEASIBLE_COST), quote("b", INFEASIBLE_COST)];
        let best = select_venue(&quotes).unwrap();
        assert_eq!(best.venue.as_str(), "a");
        assert!(!best.feasible);
    }

    #[test]
    fn test_decision_from_quote() {
        let q = quote("b", dec!(894.6));
        let decision = HedgeDecision::from_quote(&q, Size::new(dec!(100)), HedgeDirection::Short, dec!(2));
        assert_eq!(decision.venue().as_str(), "b");
        assert_eq!(decision.order_side(), OrderSide::Sell);
        assert_eq!(decision.limit_price(), Some(Price::new(dec!(100))));
        assert_eq!(decision.adjusted_cost(), dec!(894.6));
        assert!(decision.is_feasible());
    }
}
