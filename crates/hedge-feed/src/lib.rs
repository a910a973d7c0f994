//! Market data aggregation across venues.
//!
//! Fans out to every configured venue concurrently, keeps only the markets
//! accepted by the [`SymbolFilter`], and gathers one [`VenueSnapshot`] per
//! (venue, symbol). Venue failures degrade to fallback values and are
//! reported as [`FeedWarning`]s; they never abort an aggregation.
//!
//! [`VenueSnapshot`]: hedge_core::VenueSnapshot

pub mod aggregator;
pub mod config;
pub mod error;
pub mod filter;
pub mod pacer;
pub mod warning;

pub use aggregator::{Aggregation, MarketDataAggregator};
pub use config::FeedConfig;
pub use error::{FeedError, FeedResult};
pub use filter::SymbolFilter;
pub use pacer::Pacer;
pub use warning::{FeedWarning, FeedWarningKind};
