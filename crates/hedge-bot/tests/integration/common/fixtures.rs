//! Shared mocks and configuration for cycle tests.

use std::sync::Arc;

use hedge_bot::{AppConfig, Application, OperatingMode};
use hedge_chain::{DynChainClient, MockChainClient, U256};
use hedge_core::OrderBook;
use hedge_venue::{perp_market, DynVenueClient, MockVenueClient};
use rust_decimal_macros::dec;

pub const ROUTER: &str = "0x7a250d5630b4cf539739df2c5dacb4c659f2488d";
pub const TOKEN_IN: &str = "0x7f39c581f595b53c5cb19bd0b3f8da6c935e2ca0";
pub const TOKEN_OUT: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";

/// Venue whose fee-adjusted cost for 2 ETH is 178.92 (asks at 90, fee 0.001).
pub fn cheap_venue() -> Arc<MockVenueClient> {
    Arc::new(
        MockVenueClient::new("cheap")
            .with_market(perp_market("ETHUSDT", "ETH", "USDT", Some(dec!(0.001))))
            .with_book(
                "ETHUSDT",
                OrderBook::from_pairs(&[[dec!(89), dec!(10)]], &[[dec!(90), dec!(10)]]),
            )
            .with_funding("ETHUSDT", dec!(0)),
    )
}

/// Venue whose fee-adjusted cost for 2 ETH is 199.4 (asks at 100, fee 0.0005).
pub fn rival_venue() -> Arc<MockVenueClient> {
    Arc::new(
        MockVenueClient::new("rival")
            .with_market(perp_market("ETHUSDT", "ETH", "USDT", Some(dec!(0.0005))))
            .with_book(
                "ETHUSDT",
                OrderBook::from_pairs(&[[dec!(99), dec!(10)]], &[[dec!(100), dec!(10)]]),
            )
            .with_funding("ETHUSDT", dec!(0)),
    )
}

pub fn chain() -> Arc<MockChainClient> {
    let chain = MockChainClient::new().with_state(U256::from(1_000u64));
    chain.set_block(100);
    Arc::new(chain)
}

pub fn config(mode: OperatingMode) -> AppConfig {
    let mut config = AppConfig::default();
    config.mode = mode;
    config.chain.router_address = ROUTER.to_string();
    config.chain.token_in = TOKEN_IN.to_string();
    config.chain.token_out = TOKEN_OUT.to_string();
    config.pricing.amount = dec!(2);
    config.execution.confirmation_timeout_ms = 1_000;
    config.execution.order_timeout_ms = 1_000;
    config
}

pub fn app(
    mode: OperatingMode,
    venues: &[&Arc<MockVenueClient>],
    chain: &Arc<MockChainClient>,
) -> Application {
    let venues: Vec<DynVenueClient> = venues
        .iter()
        .map(|venue| {
            let client: DynVenueClient = (*venue).clone();
            client
        })
        .collect();
    let chain: DynChainClient = chain.clone();
    Application::new(config(mode), venues, Some(chain)).unwrap()
}
