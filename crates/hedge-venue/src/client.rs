//! Venue capability trait.
//!
//! Heterogeneous exchange APIs are reduced to one object-safe interface:
//! market listing, order book, funding rate, order placement and the
//! venue's minimum spacing between calls. Methods return boxed futures so
//! clients can be held as `Arc<dyn VenueClient>`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use hedge_core::{MarketInfo, OrderAck, OrderBook, OrderRequest, VenueId};
use rust_decimal::Decimal;

use crate::error::VenueResult;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait implemented by every venue adapter.
pub trait VenueClient: Send + Sync {
    /// Venue identifier used in snapshots, decisions and logs.
    fn id(&self) -> &VenueId;

    /// Minimum delay between two consecutive calls to this venue.
    fn rate_limit_interval(&self) -> Duration;

    /// List markets. Cached listings are reused unless `force_reload` is set.
    fn load_markets(&self, force_reload: bool) -> BoxFuture<'_, VenueResult<Vec<MarketInfo>>>;

    /// Fetch the order book for a venue-native symbol.
    fn fetch_order_book<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, VenueResult<OrderBook>>;

    /// Fetch the current funding rate for a venue-native symbol.
    fn fetch_funding_rate<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, VenueResult<Decimal>>;

    /// Place an order.
    fn create_order(&self, request: OrderRequest) -> BoxFuture<'_, VenueResult<OrderAck>>;
}

/// Arc wrapper for VenueClient trait objects.
pub type DynVenueClient = Arc<dyn VenueClient>;
