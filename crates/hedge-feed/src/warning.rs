//! Non-fatal conditions raised during aggregation.

use std::fmt;

use hedge_core::VenueId;

/// Which venue call degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedWarningKind {
    /// Market listing failed; the venue was skipped.
    MetadataLoad,
    /// Order book fetch failed; the snapshot has empty sides.
    OrderBookFetch,
    /// Funding rate fetch failed; the snapshot has no funding rate.
    FundingRateFetch,
}

impl FeedWarningKind {
    /// Metric label for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MetadataLoad => "markets",
            Self::OrderBookFetch => "order_book",
            Self::FundingRateFetch => "funding",
        }
    }
}

/// A degraded venue call, with the fallback already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedWarning {
    pub venue: VenueId,
    /// `None` for venue-level failures.
    pub symbol: Option<String>,
    pub kind: FeedWarningKind,
    pub reason: String,
}

impl FeedWarning {
    pub fn new(
        venue: VenueId,
        symbol: Option<&str>,
        kind: FeedWarningKind,
        reason: impl fmt::Display,
    ) -> Self {
        Self {
            venue,
            symbol: symbol.map(str::to_string),
            kind,
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for FeedWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.symbol {
            Some(symbol) => write!(
                f,
                "{} {} {}: {}",
                self.venue,
                symbol,
                self.kind.as_str(),
                self.reason
            ),
            None => write!(f, "{} {}: {}", self.venue, self.kind.as_str(), self.reason),
        }
    }
}
