//! Multi-venue snapshot aggregation.
//!
//! One aggregation pass:
//! 1. every venue concurrently loads its market listing
//! 2. markets are filtered by the [`SymbolFilter`]
//! 3. every matching symbol concurrently fetches order book and funding rate
//!
//! All calls to one venue go through that venue's [`Pacer`], so fan-out within
//! a venue is concurrent in structure but serialised on the wire. Results are
//! collected with `join_all`; nothing fails fast.

use std::future::Future;

use futures_util::future::join_all;
use hedge_core::{MarketInfo, OrderBook, OrderSide, Size, VenueId, VenueSnapshot};
use hedge_telemetry::Metrics;
use hedge_venue::{DynVenueClient, VenueError, VenueResult};
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::filter::SymbolFilter;
use crate::pacer::Pacer;
use crate::warning::{FeedWarning, FeedWarningKind};

/// Result of one aggregation pass.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// One snapshot per (venue, matching symbol), venues in configured order.
    pub snapshots: Vec<VenueSnapshot>,
    /// Degraded calls, with fallbacks already applied.
    pub warnings: Vec<FeedWarning>,
}

impl Aggregation {
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

struct PacedVenue {
    client: DynVenueClient,
    pacer: Pacer,
}

/// Gathers snapshots from all configured venues.
///
/// Pacers live as long as the aggregator, so spacing is also enforced
/// between consecutive aggregations.
pub struct MarketDataAggregator {
    venues: Vec<PacedVenue>,
    filter: SymbolFilter,
    config: FeedConfig,
}

impl MarketDataAggregator {
    pub fn new(clients: Vec<DynVenueClient>, filter: SymbolFilter, config: FeedConfig) -> Self {
        let venues = clients
            .into_iter()
            .map(|client| PacedVenue {
                pacer: Pacer::new(client.rate_limit_interval()),
                client,
            })
            .collect();
        Self {
            venues,
            filter,
            config,
        }
    }

    /// Client for `id`, if configured.
    pub fn venue(&self, id: &VenueId) -> Option<DynVenueClient> {
        self.venues
            .iter()
            .find(|v| v.client.id() == id)
            .map(|v| DynVenueClient::clone(&v.client))
    }

    pub fn venue_count(&self) -> usize {
        self.venues.len()
    }

    /// Gather snapshots from every venue for every matching symbol.
    ///
    /// `target` is only used for depth reporting. An empty result is valid.
    pub async fn aggregate(&self, target: Size) -> Aggregation {
        let per_venue = join_all(
            self.venues
                .iter()
                .map(|venue| self.aggregate_venue(venue, target)),
        )
        .await;

        let mut aggregation = Aggregation::default();
        for (snapshots, warnings) in per_venue {
            aggregation.snapshots.extend(snapshots);
            aggregation.warnings.extend(warnings);
        }

        Metrics::snapshots(aggregation.snapshots.len());
        info!(
            venues = self.venues.len(),
            snapshots = aggregation.snapshots.len(),
            warnings = aggregation.warnings.len(),
            "Aggregation complete"
        );
        aggregation
    }

    /// Run a venue call through its pacer, bounded by the request timeout.
    async fn call<T>(
        &self,
        venue: &PacedVenue,
        call: impl Future<Output = VenueResult<T>>,
    ) -> VenueResult<T> {
        let timeout = self.config.request_timeout();
        venue
            .pacer
            .run(async {
                tokio::time::timeout(timeout, call)
                    .await
                    .unwrap_or(Err(VenueError::Timeout))
            })
            .await
    }

    async fn aggregate_venue(
        &self,
        venue: &PacedVenue,
        target: Size,
    ) -> (Vec<VenueSnapshot>, Vec<FeedWarning>) {
        let id = venue.client.id();

        let markets = match self
            .call(venue, venue.client.load_markets(self.config.force_reload_markets))
            .await
        {
            Ok(markets) => markets,
            Err(e) => {
                warn!(venue = %id, reason = %e, "Failed to load markets, skipping venue");
                Metrics::venue_failure(id.as_str(), FeedWarningKind::MetadataLoad.as_str());
                let warning = FeedWarning::new(id.clone(), None, FeedWarningKind::MetadataLoad, e);
                return (Vec::new(), vec![warning]);
            }
        };

        let eligible: Vec<&MarketInfo> = markets.iter().filter(|m| self.filter.matches(m)).collect();
        debug!(
            venue = %id,
            markets = markets.len(),
            eligible = eligible.len(),
            "Filtered markets"
        );

        let results = join_all(
            eligible
                .into_iter()
                .map(|market| self.snapshot_symbol(venue, market, target)),
        )
        .await;

        let mut snapshots = Vec::with_capacity(results.len());
        let mut warnings = Vec::new();
        for (snapshot, symbol_warnings) in results {
            snapshots.push(snapshot);
            warnings.extend(symbol_warnings);
        }
        (snapshots, warnings)
    }

    async fn snapshot_symbol(
        &self,
        venue: &PacedVenue,
        market: &MarketInfo,
        target: Size,
    ) -> (VenueSnapshot, Vec<FeedWarning>) {
        let id = venue.client.id();
        let symbol = market.symbol.as_str();
        let mut warnings = Vec::new();

        let (book, funding) = tokio::join!(
            self.call(venue, venue.client.fetch_order_book(symbol)),
            self.call(venue, venue.client.fetch_funding_rate(symbol)),
        );

        let book = book.unwrap_or_else(|e| {
            warn!(venue = %id, symbol, reason = %e, "Order book fetch failed, using empty book");
            Metrics::venue_failure(id.as_str(), FeedWarningKind::OrderBookFetch.as_str());
            warnings.push(FeedWarning::new(
                id.clone(),
                Some(symbol),
                FeedWarningKind::OrderBookFetch,
                e,
            ));
            OrderBook::default()
        });

        let funding_rate = match funding {
            Ok(rate) => Some(rate),
            Err(e) => {
                warn!(venue = %id, symbol, reason = %e, "Funding rate fetch failed, treating as absent");
                Metrics::venue_failure(id.as_str(), FeedWarningKind::FundingRateFetch.as_str());
                warnings.push(FeedWarning::new(
                    id.clone(),
                    Some(symbol),
                    FeedWarningKind::FundingRateFetch,
                    e,
                ));
                None
            }
        };

        let snapshot = VenueSnapshot::new(id.clone(), symbol, book, funding_rate, market.taker_fee);

        let band = self.config.depth_band();
        let ask_depth = snapshot.depth_within_bps(OrderSide::Buy, band);
        let bid_depth = snapshot.depth_within_bps(OrderSide::Sell, band);
        debug!(
            venue = %id,
            symbol,
            band_bps = self.config.depth_band_bps,
            %ask_depth,
            %bid_depth,
            %target,
            asks_cover_target = ask_depth >= target,
            bids_cover_target = bid_depth >= target,
            funding_rate = ?snapshot.funding_rate,
            "Snapshot captured"
        );

        (snapshot, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hedge_venue::{perp_market, MockCall, MockVenueClient};
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    fn eth_book() -> OrderBook {
        OrderBook::from_pairs(
            &[[dec!(1999), dec!(5)]],
            &[[dec!(2000), dec!(2)], [dec!(2001), dec!(3)]],
        )
    }

    fn venue(id: &str) -> MockVenueClient {
        MockVenueClient::new(id)
            .with_market(perp_market("ETHUSDT", "ETH", "USDT", Some(dec!(0.0005))))
            .with_book("ETHUSDT", eth_book())
            .with_funding("ETHUSDT", dec!(0.0001))
    }

    fn client(venue: &Arc<MockVenueClient>) -> DynVenueClient {
        venue.clone()
    }

    fn aggregator(clients: Vec<DynVenueClient>) -> MarketDataAggregator {
        MarketDataAggregator::new(clients, SymbolFilter::default(), FeedConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_venues_is_empty() {
        let agg = aggregator(Vec::new()).aggregate(Size::new(dec!(4))).await;
        assert!(agg.is_empty());
        assert!(agg.warnings.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_per_venue_and_symbol() {
        let a = Arc::new(venue("a"));
        let b = Arc::new(venue("b").with_market(perp_market("BTCUSDT", "BTC", "USDT", None)));
        let agg = aggregator(vec![client(&a), client(&b)]).aggregate(Size::new(dec!(4))).await;

        assert_eq!(agg.snapshots.len(), 2);
        assert_eq!(agg.snapshots[0].venue.as_str(), "a");
        assert_eq!(agg.snapshots[1].venue.as_str(), "b");
        assert_eq!(agg.snapshots[0].funding_rate, Some(dec!(0.0001)));
        assert_eq!(agg.snapshots[0].taker_fee, Some(dec!(0.0005)));
        assert!(agg.warnings.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_metadata_failure_skips_venue() {
        let a = Arc::new(venue("a"));
        let b = Arc::new(venue("b"));
        b.set_fail_markets(true);

        let agg = aggregator(vec![client(&a), client(&b)]).aggregate(Size::new(dec!(4))).await;

        assert_eq!(agg.snapshots.len(), 1);
        assert_eq!(agg.warnings.len(), 1);
        assert_eq!(agg.warnings[0].kind, FeedWarningKind::MetadataLoad);
        assert_eq!(agg.warnings[0].venue.as_str(), "b");
        assert_eq!(b.calls(), vec![MockCall::LoadMarkets { force_reload: true }]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failures_use_fallbacks() {
        let a = Arc::new(venue("a"));
        a.set_fail_order_books(true);
        a.set_fail_funding(true);

        let agg = aggregator(vec![client(&a)]).aggregate(Size::new(dec!(4))).await;

        assert_eq!(agg.snapshots.len(), 1);
        let snap = &agg.snapshots[0];
        assert!(snap.book.is_empty());
        assert_eq!(snap.funding_rate, None);
        let kinds: Vec<_> = agg.warnings.iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            vec![FeedWarningKind::OrderBookFetch, FeedWarningKind::FundingRateFetch]
        );
        assert_eq!(agg.warnings[0].symbol.as_deref(), Some("ETHUSDT"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_extreme_prices_do_not_abort_aggregation() {
        let huge = rust_decimal::Decimal::MAX / dec!(10);
        let a = Arc::new(venue("a").with_book(
            "ETHUSDT",
            OrderBook::from_pairs(&[[huge, dec!(1)]], &[[huge, dec!(1)]]),
        ));

        let agg = aggregator(vec![client(&a)]).aggregate(Size::new(dec!(1))).await;

        assert_eq!(agg.snapshots.len(), 1);
        assert_eq!(
            agg.snapshots[0].depth_within_bps(OrderSide::Buy, dec!(50)),
            Size::new(dec!(1))
        );
        assert!(agg.warnings.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        let a = Arc::new(venue("a"));
        a.set_latency(Duration::from_secs(30));
        let config = FeedConfig {
            request_timeout_ms: 1_000,
            ..FeedConfig::default()
        };
        let aggregator = MarketDataAggregator::new(vec![client(&a)], SymbolFilter::default(), config);

        let start = Instant::now();
        let agg = aggregator.aggregate(Size::new(dec!(4))).await;

        assert!(agg.is_empty());
        assert_eq!(agg.warnings[0].kind, FeedWarningKind::MetadataLoad);
        assert!(agg.warnings[0].reason.contains("timed out"));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_to_one_venue_are_paced() {
        let a = Arc::new(
            venue("a")
                .with_rate_limit(Duration::from_millis(100))
                .with_market(perp_market("ETHUSDC", "ETH", "USDC", None))
                .with_book("ETHUSDC", eth_book())
                .with_funding("ETHUSDC", dec!(0.0002)),
        );
        let agg = aggregator(vec![client(&a)]).aggregate(Size::new(dec!(4))).await;
        assert_eq!(agg.snapshots.len(), 2);

        let calls = a.timed_calls();
        // markets + 2 x (book, funding)
        assert_eq!(calls.len(), 5);
        for pair in calls.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= Duration::from_millis(100));
        }
        assert_eq!(calls[0].0, MockCall::LoadMarkets { force_reload: true });
    }

    #[tokio::test(start_paused = true)]
    async fn test_venues_are_fetched_in_parallel() {
        let a = Arc::new(venue("a").with_rate_limit(Duration::from_millis(100)));
        let b = Arc::new(venue("b").with_rate_limit(Duration::from_millis(100)));

        let start = Instant::now();
        let agg = aggregator(vec![client(&a), client(&b)])
            .aggregate(Size::new(dec!(4)))
            .await;

        assert_eq!(agg.snapshots.len(), 2);
        // 3 calls per venue => 200ms of pacing each, overlapping across venues
        assert_eq!(start.elapsed(), Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_venue_lookup() {
        let aggregator = aggregator(vec![
            client(&Arc::new(venue("a"))),
            client(&Arc::new(venue("b"))),
        ]);
        assert!(aggregator.venue(&VenueId::new("b")).is_some());
        assert!(aggregator.venue(&VenueId::new("c")).is_none());
        assert_eq!(aggregator.venue_count(), 2);
    }
}
