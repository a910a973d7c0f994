//! Symbol eligibility predicate.

use hedge_core::MarketInfo;
use serde::{Deserialize, Serialize};

/// Selects the markets worth snapshotting.
///
/// Asset comparisons are case-insensitive. Empty asset lists match nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolFilter {
    /// Accepted base assets. Default: ["ETH"].
    #[serde(default = "default_base_assets")]
    pub base_assets: Vec<String>,
    /// Accepted quote assets. Default: ["USD", "USDT", "USDC"].
    #[serde(default = "default_quote_assets")]
    pub quote_assets: Vec<String>,
    /// Only accept perpetual swap contracts. Default: true.
    #[serde(default = "default_require_perpetual")]
    pub require_perpetual: bool,
}

fn default_base_assets() -> Vec<String> {
    vec!["ETH".to_string()]
}

fn default_quote_assets() -> Vec<String> {
    vec!["USD".to_string(), "USDT".to_string(), "USDC".to_string()]
}

fn default_require_perpetual() -> bool {
    true
}

impl Default for SymbolFilter {
    fn default() -> Self {
        Self {
            base_assets: default_base_assets(),
            quote_assets: default_quote_assets(),
            require_perpetual: default_require_perpetual(),
        }
    }
}

impl SymbolFilter {
    pub fn matches(&self, market: &MarketInfo) -> bool {
        let contains = |set: &[String], asset: &str| set.iter().any(|a| a.eq_ignore_ascii_case(asset));

        contains(&self.base_assets, &market.base)
            && contains(&self.quote_assets, &market.quote)
            && (!self.require_perpetual || market.is_perpetual())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hedge_venue::perp_market;

    #[test]
    fn test_default_filter() {
        let filter = SymbolFilter::default();
        assert!(filter.matches(&perp_market("ETHUSDT", "ETH", "USDT", None)));
        assert!(filter.matches(&perp_market("ETHUSDC", "eth", "usdc", None)));
        assert!(!filter.matches(&perp_market("BTCUSDT", "BTC", "USDT", None)));
        assert!(!filter.matches(&perp_market("ETHBTC", "ETH", "BTC", None)));
    }

    #[test]
    fn test_perpetual_requirement() {
        let mut dated = perp_market("ETH-27JUN25", "ETH", "USDT", None);
        dated.is_swap = false;

        let filter = SymbolFilter::default();
        assert!(!filter.matches(&dated));

        let relaxed = SymbolFilter {
            require_perpetual: false,
            ..SymbolFilter::default()
        };
        assert!(relaxed.matches(&dated));
    }

    #[test]
    fn test_deserialize_partial() {
        let filter: SymbolFilter = toml::from_str(r#"quote_assets = ["USDT"]"#).unwrap();
        assert_eq!(filter.base_assets, vec!["ETH"]);
        assert_eq!(filter.quote_assets, vec!["USDT"]);
        assert!(filter.require_perpetual);
    }
}
