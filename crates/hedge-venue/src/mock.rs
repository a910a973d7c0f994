//! Scripted venue client for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use hedge_core::{MarketInfo, OrderAck, OrderBook, OrderRequest, VenueId};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::time::Instant;

use crate::client::{BoxFuture, VenueClient};
use crate::error::{VenueError, VenueResult};

/// A call made against a [`MockVenueClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    LoadMarkets { force_reload: bool },
    FetchOrderBook(String),
    FetchFundingRate(String),
    CreateOrder(String),
}

/// Mock venue with scripted responses and a call log.
///
/// Each call is recorded with the (tokio) instant it started, so pacing can
/// be asserted under a paused clock.
#[derive(Debug)]
pub struct MockVenueClient {
    id: VenueId,
    rate_limit: Duration,
    markets: Mutex<Vec<MarketInfo>>,
    books: Mutex<HashMap<String, OrderBook>>,
    funding: Mutex<HashMap<String, Decimal>>,
    fail_markets: AtomicBool,
    fail_order_books: AtomicBool,
    fail_funding: AtomicBool,
    reject_orders: Mutex<Option<String>>,
    latency: Mutex<Duration>,
    calls: Mutex<Vec<(MockCall, Instant)>>,
    orders: Mutex<Vec<OrderRequest>>,
}

/// Perpetual swap market with the given symbol and assets.
pub fn perp_market(symbol: &str, base: &str, quote: &str, taker_fee: Option<Decimal>) -> MarketInfo {
    MarketInfo {
        symbol: symbol.to_string(),
        base: base.to_string(),
        quote: quote.to_string(),
        is_contract: true,
        is_swap: true,
        taker_fee,
    }
}

impl MockVenueClient {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: VenueId::new(id),
            rate_limit: Duration::ZERO,
            markets: Mutex::new(Vec::new()),
            books: Mutex::new(HashMap::new()),
            funding: Mutex::new(HashMap::new()),
            fail_markets: AtomicBool::new(false),
            fail_order_books: AtomicBool::new(false),
            fail_funding: AtomicBool::new(false),
            reject_orders: Mutex::new(None),
            latency: Mutex::new(Duration::ZERO),
            calls: Mutex::new(Vec::new()),
            orders: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: Duration) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    #[must_use]
    pub fn with_market(mut self, market: MarketInfo) -> Self {
        self.markets.get_mut().push(market);
        self
    }

    #[must_use]
    pub fn with_book(mut self, symbol: &str, book: OrderBook) -> Self {
        self.books.get_mut().insert(symbol.to_string(), book);
        self
    }

    #[must_use]
    pub fn with_funding(mut self, symbol: &str, rate: Decimal) -> Self {
        self.funding.get_mut().insert(symbol.to_string(), rate);
        self
    }

    pub fn set_fail_markets(&self, fail: bool) {
        self.fail_markets.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_order_books(&self, fail: bool) {
        self.fail_order_books.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_funding(&self, fail: bool) {
        self.fail_funding.store(fail, Ordering::SeqCst);
    }

    /// Reject every order with `reason` (`None` accepts orders).
    pub fn set_reject_orders(&self, reason: Option<&str>) {
        *self.reject_orders.lock() = reason.map(str::to_string);
    }

    /// Delay applied to every call before it answers.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    /// Calls made so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().iter().map(|(c, _)| c.clone()).collect()
    }

    /// Calls made so far with their start instants.
    pub fn timed_calls(&self) -> Vec<(MockCall, Instant)> {
        self.calls.lock().clone()
    }

    /// Orders received (including rejected ones).
    pub fn orders(&self) -> Vec<OrderRequest> {
        self.orders.lock().clone()
    }

    pub fn order_count(&self) -> usize {
        self.orders.lock().len()
    }

    async fn enter(&self, call: MockCall) {
        self.calls.lock().push((call, Instant::now()));
        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

impl VenueClient for MockVenueClient {
    fn id(&self) -> &VenueId {
        &self.id
    }

    fn rate_limit_interval(&self) -> Duration {
        self.rate_limit
    }

    fn load_markets(&self, force_reload: bool) -> BoxFuture<'_, VenueResult<Vec<MarketInfo>>> {
        Box::pin(async move {
            self.enter(MockCall::LoadMarkets { force_reload }).await;
            if self.fail_markets.load(Ordering::SeqCst) {
                return Err(VenueError::Http("mock: markets unavailable".to_string()));
            }
            Ok(self.markets.lock().clone())
        })
    }

    fn fetch_order_book<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, VenueResult<OrderBook>> {
        Box::pin(async move {
            self.enter(MockCall::FetchOrderBook(symbol.to_string())).await;
            if self.fail_order_books.load(Ordering::SeqCst) {
                return Err(VenueError::Http("mock: order book unavailable".to_string()));
            }
            self.books
                .lock()
                .get(symbol)
                .cloned()
                .ok_or_else(|| VenueError::UnknownSymbol(symbol.to_string()))
        })
    }

    fn fetch_funding_rate<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, VenueResult<Decimal>> {
        Box::pin(async move {
            self.enter(MockCall::FetchFundingRate(symbol.to_string())).await;
            if self.fail_funding.load(Ordering::SeqCst) {
                return Err(VenueError::Http("mock: funding unavailable".to_string()));
            }
            self.funding
                .lock()
                .get(symbol)
                .copied()
                .ok_or_else(|| VenueError::UnknownSymbol(symbol.to_string()))
        })
    }

    fn create_order(&self, request: OrderRequest) -> BoxFuture<'_, VenueResult<OrderAck>> {
        Box::pin(async move {
            self.enter(MockCall::CreateOrder(request.symbol.clone())).await;
            self.orders.lock().push(request.clone());
            let rejection = self.reject_orders.lock().clone();
            if let Some(reason) = rejection {
                return Err(VenueError::Rejected(reason));
            }
            Ok(OrderAck {
                order_id: format!("mock-{}", self.order_count()),
                client_order_id: request.client_order_id,
                status: "NEW".to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hedge_core::{OrderSide, Price, Size};
    use rust_decimal_macros::dec;

    fn venue() -> MockVenueClient {
        MockVenueClient::new("mock")
            .with_market(perp_market("ETHUSDT", "ETH", "USDT", Some(dec!(0.0005))))
            .with_book(
                "ETHUSDT",
                OrderBook::from_pairs(&[[dec!(99), dec!(1)]], &[[dec!(100), dec!(2)]]),
            )
            .with_funding("ETHUSDT", dec!(0.0001))
    }

    #[tokio::test]
    async fn test_scripted_responses() {
        let venue = venue();
        assert_eq!(venue.load_markets(true).await.unwrap().len(), 1);
        let book = venue.fetch_order_book("ETHUSDT").await.unwrap();
        assert_eq!(book.asks[0].price, Price::new(dec!(100)));
        assert_eq!(venue.fetch_funding_rate("ETHUSDT").await.unwrap(), dec!(0.0001));
        assert!(venue.fetch_order_book("BTCUSDT").await.is_err());
        assert_eq!(
            venue.calls(),
            vec![
                MockCall::LoadMarkets { force_reload: true },
                MockCall::FetchOrderBook("ETHUSDT".to_string()),
                MockCall::FetchFundingRate("ETHUSDT".to_string()),
                MockCall::FetchOrderBook("BTCUSDT".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_toggles() {
        let venue = venue();
        venue.set_fail_markets(true);
        venue.set_fail_funding(true);
        assert!(venue.load_markets(false).await.is_err());
        assert!(venue.fetch_funding_rate("ETHUSDT").await.is_err());
        assert!(venue.fetch_order_book("ETHUSDT").await.is_ok());
    }

    #[tokio::test]
    async fn test_order_rejection_is_logged() {
        let venue = venue();
        let req = OrderRequest::limit_gtc(
            "ETHUSDT",
            OrderSide::Sell,
            Size::new(dec!(1)),
            Price::new(dec!(100)),
        )
        .unwrap();
        assert!(venue.create_order(req.clone()).await.is_ok());

        venue.set_reject_orders(Some("insufficient margin"));
        let err = venue.create_order(req).await.unwrap_err();
        assert!(matches!(err, VenueError::Rejected(_)));
        assert_eq!(venue.order_count(), 2);
    }
}
