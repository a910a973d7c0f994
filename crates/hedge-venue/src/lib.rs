//! Venue capability interface and REST adapters.
//!
//! Every external exchange is reached through the [`VenueClient`] trait so the
//! aggregator and execution coordinator stay venue-agnostic. One adapter per
//! concrete venue lives here, plus a scripted [`MockVenueClient`] for tests.
//!
//! # Key Components
//!
//! - [`VenueClient`]: load markets, fetch order book / funding, place orders
//! - [`BinanceUsdm`]: Binance USDⓈ-M futures adapter
//! - [`BinanceCoinm`]: Binance COIN-M futures adapter (contract sizes normalized)
//! - [`Bybit`]: Bybit v5 linear perpetuals adapter
//! - [`build_venue`]: construct an adapter from [`VenueConfig`]

pub mod binance;
pub mod binance_coinm;
pub mod bybit;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod mock;

pub use binance::BinanceUsdm;
pub use binance_coinm::BinanceCoinm;
pub use bybit::Bybit;
pub use client::{BoxFuture, DynVenueClient, VenueClient};
pub use config::{build_venue, VenueConfig, VenueKind};
pub use error::{VenueError, VenueResult};
pub use http::{Credentials, HttpTransport};
pub use mock::{perp_market, MockCall, MockVenueClient};
