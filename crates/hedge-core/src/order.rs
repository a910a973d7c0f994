//! Order-related types and identifiers.
//!
//! Provides order side, hedge direction, order type, time-in-force, client
//! order IDs and the venue-agnostic order request/ack pair.

use crate::{CoreError, Price, Result, Size};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Directional exposure the hedge position should carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HedgeDirection {
    Long,
    Short,
}

impl HedgeDirection {
    /// Side of the hedge order that opens this exposure.
    ///
    /// The chain leg acquires the asset, so a short hedge sells on the venue.
    pub fn order_side(&self) -> OrderSide {
        match self {
            Self::Long => OrderSide::Buy,
            Self::Short => OrderSide::Sell,
        }
    }
}

impl fmt::Display for HedgeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "long"),
            Self::Short => write!(f, "short"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Limit,
    Market,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limit => write!(f, "limit"),
            Self::Market => write!(f, "market"),
        }
    }
}

/// Time-in-force for orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good-til-cancelled (hedge orders rest until filled or cancelled).
    #[default]
    #[serde(rename = "GTC")]
    GoodTilCancelled,
    /// Immediate-or-cancel.
    #[serde(rename = "IOC")]
    ImmediateOrCancel,
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoodTilCancelled => write!(f, "GTC"),
            Self::ImmediateOrCancel => write!(f, "IOC"),
        }
    }
}

/// Client order ID for idempotency.
///
/// Sent with every hedge order so a venue-side duplicate can be detected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientOrderId(String);

impl ClientOrderId {
    /// Create a new unique client order ID.
    ///
    /// Format: `hedge_{timestamp_ms}_{uuid_short}` (at most 32 chars, which
    /// every supported venue accepts).
    pub fn new() -> Self {
        let ts = chrono::Utc::now().timestamp_millis();
        let uuid_short = &Uuid::new_v4().simple().to_string()[..8];
        Self(format!("hedge_{ts}_{uuid_short}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClientOrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ClientOrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Venue-agnostic order request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub order_type: OrderType,
    pub side: OrderSide,
    pub amount: Size,
    pub price: Price,
    pub time_in_force: TimeInForce,
    pub client_order_id: ClientOrderId,
}

impl OrderRequest {
    /// GTC limit order with a fresh client order ID.
    ///
    /// Rejects a non-positive amount or price before anything is sent.
    pub fn limit_gtc(
        symbol: impl Into<String>,
        side: OrderSide,
        amount: Size,
        price: Price,
    ) -> Result<Self> {
        if !amount.is_positive() {
            return Err(CoreError::InvalidSize(amount.to_string()));
        }
        if !price.is_positive() {
            return Err(CoreError::InvalidPrice(price.to_string()));
        }
        Ok(Self {
            symbol: symbol.into(),
            order_type: OrderType::Limit,
            side,
            amount,
            price,
            time_in_force: TimeInForce::GoodTilCancelled,
            client_order_id: ClientOrderId::new(),
        })
    }
}

/// Venue confirmation of an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    /// Venue-assigned order ID.
    pub order_id: String,
    /// Echo of the client order ID.
    pub client_order_id: ClientOrderId,
    /// Venue status string (e.g., "NEW").
    pub status: String,
}
