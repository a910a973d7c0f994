//! Order book and per-venue snapshot types.
//!
//! A [`VenueSnapshot`] is the bundle captured for one (venue, symbol) pair in
//! one aggregation pass. Levels are always kept price-sorted: bids descending,
//! asks ascending. An empty side is valid and simply has zero depth.

use crate::{OrderSide, Price, Size, VenueId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One price level of an order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookLevel {
    /// Level price (positive).
    pub price: Price,
    /// Volume available at this price (non-negative).
    pub size: Size,
}

impl OrderBookLevel {
    pub fn new(price: Price, size: Size) -> Self {
        Self { price, size }
    }

    /// Whether this level can be part of a book.
    fn is_well_formed(&self) -> bool {
        self.price.is_positive() && !self.size.inner().is_sign_negative()
    }
}

/// Two-sided order book as fetched from a venue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBook {
    /// Bid levels, best (highest) first.
    pub bids: Vec<OrderBookLevel>,
    /// Ask levels, best (lowest) first.
    pub asks: Vec<OrderBookLevel>,
}

impl OrderBook {
    /// Build a book from raw levels.
    ///
    /// Malformed levels (non-positive price, negative size) are dropped and
    /// both sides are sorted best-first, whatever order the venue used.
    pub fn new(bids: Vec<OrderBookLevel>, asks: Vec<OrderBookLevel>) -> Self {
        let mut bids: Vec<_> = bids.into_iter().filter(|l| l.is_well_formed()).collect();
        let mut asks: Vec<_> = asks.into_iter().filter(|l| l.is_well_formed()).collect();
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        asks.sort_by(|a, b| a.price.cmp(&b.price));
        Self { bids, asks }
    }

    /// Build a book from `[price, size]` pairs.
    pub fn from_pairs(bids: &[[Decimal; 2]], asks: &[[Decimal; 2]]) -> Self {
        let to_levels = |pairs: &[[Decimal; 2]]| {
            pairs
                .iter()
                .map(|[p, s]| OrderBookLevel::new(Price::new(*p), Size::new(*s)))
                .collect::<Vec<_>>()
        };
        Self::new(to_levels(bids), to_levels(asks))
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

/// Order book and funding data for one symbol on one venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueSnapshot {
    /// Venue the data came from.
    pub venue: VenueId,
    /// Venue-native trading symbol.
    pub symbol: String,
    /// Sorted order book (may be empty after a failed fetch).
    pub book: OrderBook,
    /// Funding rate per period. `None` when unavailable.
    pub funding_rate: Option<Decimal>,
    /// Taker fee fraction. `None` when unknown.
    pub taker_fee: Option<Decimal>,
    /// When the data was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl VenueSnapshot {
    pub fn new(
        venue: VenueId,
        symbol: impl Into<String>,
        book: OrderBook,
        funding_rate: Option<Decimal>,
        taker_fee: Option<Decimal>,
    ) -> Self {
        Self {
            venue,
            symbol: symbol.into(),
            book,
            funding_rate,
            taker_fee,
            fetched_at: Utc::now(),
        }
    }

    /// Levels consumed by an order on `side`: buys walk asks, sells walk bids.
    pub fn levels_for(&self, side: OrderSide) -> &[OrderBookLevel] {
        match side {
            OrderSide::Buy => &self.book.asks,
            OrderSide::Sell => &self.book.bids,
        }
    }

    /// Volume strictly within `band_bps` of the best level on the consumed side.
    ///
    /// For buys the band extends upwards from the best ask, for sells
    /// downwards from the best bid. Empty sides have zero depth. A band edge
    /// that overflows `Decimal` leaves the band unbounded.
    pub fn depth_within_bps(&self, side: OrderSide, band_bps: Decimal) -> Size {
        let levels = self.levels_for(side);
        let Some(best) = levels.first().map(|l| l.price) else {
            return Size::ZERO;
        };
        let edge = match side {
            OrderSide::Buy => best.offset_bps(band_bps),
            OrderSide::Sell => best.offset_bps(-band_bps),
        };
        let in_band = |price: Price| match (side, edge) {
            (_, None) => true,
            (OrderSide::Buy, Some(ceiling)) => price < ceiling,
            (OrderSide::Sell, Some(floor)) => price > floor,
        };
        levels
            .iter()
            .take_while(|l| in_band(l.price))
            .fold(Size::ZERO, |acc, l| acc.saturating_add(l.size))
    }
}
