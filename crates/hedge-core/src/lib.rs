//! Core domain types for the multi-venue hedge engine.
//!
//! This crate provides fundamental types used throughout the system:
//! - `Price`, `Size`: Precision-safe numeric types
//! - `VenueId`, `MarketInfo`: Venue identity and market metadata
//! - `OrderBook`, `OrderBookLevel`, `VenueSnapshot`: Per-venue market data
//! - `OrderSide`, `HedgeDirection`, `OrderRequest`: Trading enums and orders

pub mod book;
pub mod decimal;
pub mod error;
pub mod order;
pub mod venue;

pub use book::{OrderBook, OrderBookLevel, VenueSnapshot};
pub use decimal::{finite_decimal, parse_decimal, Price, Size};
pub use error::{CoreError, Result};
pub use order::{
    ClientOrderId, HedgeDirection, OrderAck, OrderRequest, OrderSide, OrderType, TimeInForce,
};
pub use venue::{MarketInfo, VenueId};
