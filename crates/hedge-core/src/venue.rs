//! Venue identity and market metadata.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an external trading venue (e.g., "binanceusdm").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VenueId(String);

impl VenueId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Market metadata as returned by a venue's market listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketInfo {
    /// Venue-native symbol used for all market data and order calls.
    pub symbol: String,
    /// Base asset (e.g., "ETH").
    pub base: String,
    /// Quote or settlement asset (e.g., "USDT").
    pub quote: String,
    /// Whether the market is a derivatives contract.
    pub is_contract: bool,
    /// Whether the contract is a perpetual swap.
    pub is_swap: bool,
    /// Taker fee as a fraction (0.0005 = 5 bps). `None` when unknown.
    pub taker_fee: Option<Decimal>,
}

impl MarketInfo {
    /// Whether this market is a perpetual swap contract.
    pub fn is_perpetual(&self) -> bool {
        self.is_contract && self.is_swap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_venue_id_display() {
        let id = VenueId::new("bybit");
        assert_eq!(id.to_string(), "bybit");
        assert_eq!(id.as_str(), "bybit");
    }

    #[test]
    fn test_market_is_perpetual() {
        let mut market = MarketInfo {
            symbol: "ETHUSDT".to_string(),
            base: "ETH".to_string(),
            quote: "USDT".to_string(),
            is_contract: true,
            is_swap: true,
            taker_fee: Some(dec!(0.0005)),
        };
        assert!(market.is_perpetual());

        market.is_swap = false;
        assert!(!market.is_perpetual());
    }
}
