//! Binance COIN-M futures adapter.
//!
//! Coin-margined contracts are quoted in USD but sized in contracts of a
//! fixed USD face value (`contractSize`, 10 USD for ETH). Book volumes are
//! converted to base-asset volume on the way in (`contracts * face / price`)
//! so fills compare with the linear venues, and hedge amounts are converted
//! back to whole contracts at the order's limit price on the way out.
//!
//! Public endpoints: `GET /dapi/v1/exchangeInfo`, `GET /dapi/v1/depth`,
//! `GET /dapi/v1/premiumIndex`. Orders go to the signed `POST /dapi/v1/order`.

use std::collections::HashMap;
use std::time::Duration;

use hedge_core::{MarketInfo, OrderAck, OrderBook, OrderBookLevel, OrderRequest, Size, VenueId};
use parking_lot::Mutex;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing::{debug, info};

use crate::binance::{
    map_api_error, order_params, parse_funding_rate, post_signed_order, DepthResponse,
    PremiumIndex,
};
use crate::client::{BoxFuture, VenueClient};
use crate::error::{VenueError, VenueResult};
use crate::http::{parse_levels, Credentials, HttpTransport};

/// Production REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://dapi.binance.com";
/// Minimum spacing between calls.
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(50);
/// Standard taker fee tier.
pub const DEFAULT_TAKER_FEE: Decimal = dec!(0.0005);

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<RawSymbol>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSymbol {
    symbol: String,
    contract_type: String,
    contract_status: String,
    base_asset: String,
    quote_asset: String,
    contract_size: Decimal,
}

/// Tradable markets with the USD face value of one contract per symbol.
fn parse_markets(
    info: ExchangeInfo,
    taker_fee: Option<Decimal>,
) -> (Vec<MarketInfo>, HashMap<String, Decimal>) {
    let mut contract_sizes = HashMap::new();
    let markets = info
        .symbols
        .into_iter()
        .filter(|s| s.contract_status == "TRADING" && s.contract_size > Decimal::ZERO)
        .map(|s| {
            contract_sizes.insert(s.symbol.clone(), s.contract_size);
            MarketInfo {
                is_swap: s.contract_type == "PERPETUAL",
                symbol: s.symbol,
                base: s.base_asset,
                quote: s.quote_asset,
                is_contract: true,
                taker_fee,
            }
        })
        .collect();
    (markets, contract_sizes)
}

/// Book with contract counts converted to base-asset volume.
fn parse_book(depth: DepthResponse, contract_size: Decimal) -> VenueResult<OrderBook> {
    let to_base = |levels: Vec<OrderBookLevel>| {
        levels
            .into_iter()
            .filter(|l| l.price.is_positive())
            .map(|l| {
                l.size
                    .inner()
                    .checked_mul(contract_size)
                    .and_then(|face| face.checked_div(l.price.inner()))
                    .map(|base| OrderBookLevel::new(l.price, Size::new(base)))
                    .ok_or_else(|| {
                        VenueError::Parse(format!("level volume out of range at {}", l.price))
                    })
            })
            .collect::<VenueResult<Vec<_>>>()
    };
    Ok(OrderBook::new(
        to_base(parse_levels(&depth.bids)?)?,
        to_base(parse_levels(&depth.asks)?)?,
    ))
}

/// Whole contracts covering at most `request.amount` of the base asset at
/// the limit price.
fn order_contracts(request: &OrderRequest, contract_size: Decimal) -> VenueResult<Decimal> {
    let contracts = request
        .amount
        .inner()
        .checked_mul(request.price.inner())
        .and_then(|face| face.checked_div(contract_size))
        .map(|c| c.round_dp_with_strategy(0, RoundingStrategy::ToZero))
        .ok_or_else(|| VenueError::Parse(format!("order size out of range for {}", request.symbol)))?;
    if contracts.is_zero() {
        return Err(VenueError::Rejected(format!(
            "{} {} is below one contract of {contract_size} USD",
            request.amount, request.symbol
        )));
    }
    Ok(contracts)
}

// ============================================================================
// Client
// ============================================================================

/// Binance COIN-M futures REST client.
pub struct BinanceCoinm {
    id: VenueId,
    transport: HttpTransport,
    credentials: Option<Credentials>,
    rate_limit: Duration,
    book_depth: u32,
    taker_fee: Option<Decimal>,
    markets: Mutex<Option<Vec<MarketInfo>>>,
    contract_sizes: Mutex<HashMap<String, Decimal>>,
}

impl BinanceCoinm {
    /// Create a client against `base_url` with the given request timeout.
    pub fn new(
        id: VenueId,
        base_url: impl Into<String>,
        request_timeout: Duration,
    ) -> VenueResult<Self> {
        Ok(Self {
            id,
            transport: HttpTransport::new(base_url, request_timeout)?,
            credentials: None,
            rate_limit: DEFAULT_RATE_LIMIT,
            book_depth: 100,
            taker_fee: Some(DEFAULT_TAKER_FEE),
            markets: Mutex::new(None),
            contract_sizes: Mutex::new(HashMap::new()),
        })
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: Duration) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    #[must_use]
    pub fn with_book_depth(mut self, depth: u32) -> Self {
        self.book_depth = depth;
        self
    }

    /// Override the taker fee reported with markets (`None` = unknown).
    #[must_use]
    pub fn with_taker_fee(mut self, taker_fee: Option<Decimal>) -> Self {
        self.taker_fee = taker_fee;
        self
    }

    async fn load_markets_inner(&self, force_reload: bool) -> VenueResult<Vec<MarketInfo>> {
        if !force_reload {
            let cached = self.markets.lock().clone();
            if let Some(cached) = cached {
                return Ok(cached);
            }
        }

        let info: ExchangeInfo = self
            .transport
            .get_json("/dapi/v1/exchangeInfo", &[])
            .await
            .map_err(map_api_error)?;
        let (markets, contract_sizes) = parse_markets(info, self.taker_fee);
        debug!(venue = %self.id, count = markets.len(), "Loaded markets");

        *self.contract_sizes.lock() = contract_sizes;
        *self.markets.lock() = Some(markets.clone());
        Ok(markets)
    }

    /// USD face value of one contract, loading the listing if needed.
    async fn contract_size(&self, symbol: &str) -> VenueResult<Decimal> {
        let cached = self.contract_sizes.lock().get(symbol).copied();
        if let Some(size) = cached {
            return Ok(size);
        }
        self.load_markets_inner(false).await?;
        self.contract_sizes
            .lock()
            .get(symbol)
            .copied()
            .ok_or_else(|| VenueError::UnknownSymbol(symbol.to_string()))
    }

    async fn fetch_order_book_inner(&self, symbol: &str) -> VenueResult<OrderBook> {
        let contract_size = self.contract_size(symbol).await?;
        let depth: DepthResponse = self
            .transport
            .get_json(
                "/dapi/v1/depth",
                &[
                    ("symbol", symbol.to_string()),
                    ("limit", self.book_depth.to_string()),
                ],
            )
            .await
            .map_err(map_api_error)?;
        parse_book(depth, contract_size)
    }

    async fn fetch_funding_rate_inner(&self, symbol: &str) -> VenueResult<Decimal> {
        // The COIN-M index is returned as a list even for a single symbol
        let indexes: Vec<PremiumIndex> = self
            .transport
            .get_json("/dapi/v1/premiumIndex", &[("symbol", symbol.to_string())])
            .await
            .map_err(map_api_error)?;
        let index = indexes
            .first()
            .ok_or_else(|| VenueError::UnknownSymbol(symbol.to_string()))?;
        parse_funding_rate(symbol, index)
    }

    async fn create_order_inner(&self, request: OrderRequest) -> VenueResult<OrderAck> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| VenueError::MissingCredentials(self.id.to_string()))?;
        let contract_size = self.contract_size(&request.symbol).await?;
        let contracts = order_contracts(&request, contract_size)?;

        info!(
            venue = %self.id,
            symbol = %request.symbol,
            side = %request.side,
            amount = %request.amount,
            %contracts,
            price = %request.price,
            client_order_id = %request.client_order_id,
            "Submitting order"
        );

        let params = order_params(&request, contracts);
        post_signed_order(&self.id, &self.transport, credentials, "/dapi/v1/order", params).await
    }
}

impl VenueClient for BinanceCoinm {
    fn id(&self) -> &VenueId {
        &self.id
    }

    fn rate_limit_interval(&self) -> Duration {
        self.rate_limit
    }

    fn load_markets(&self, force_reload: bool) -> BoxFuture<'_, VenueResult<Vec<MarketInfo>>> {
        Box::pin(self.load_markets_inner(force_reload))
    }

    fn fetch_order_book<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, VenueResult<OrderBook>> {
        Box::pin(self.fetch_order_book_inner(symbol))
    }

    fn fetch_funding_rate<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, VenueResult<Decimal>> {
        Box::pin(self.fetch_funding_rate_inner(symbol))
    }

    fn create_order(&self, request: OrderRequest) -> BoxFuture<'_, VenueResult<OrderAck>> {
        Box::pin(self.create_order_inner(request))
    }
}
