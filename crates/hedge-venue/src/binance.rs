//! Binance USDⓈ-M futures adapter.
//!
//! Public endpoints:
//! - `GET /fapi/v1/exchangeInfo` for the market listing
//! - `GET /fapi/v1/depth` for the order book
//! - `GET /fapi/v1/premiumIndex` for the last funding rate
//!
//! Orders go to the signed `POST /fapi/v1/order` endpoint. The signature is
//! an HMAC-SHA256 over the url-encoded query string, appended as `signature`.

use std::time::Duration;

use hedge_core::{
    parse_decimal, MarketInfo, OrderAck, OrderBook, OrderRequest, OrderSide, OrderType, VenueId,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::client::{BoxFuture, VenueClient};
use crate::error::{VenueError, VenueResult};
use crate::http::{format_decimal, parse_levels, timestamp_ms, Credentials, HttpTransport};

/// Production REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://fapi.binance.com";
/// Minimum spacing between calls.
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(50);
/// Standard taker fee tier.
pub const DEFAULT_TAKER_FEE: Decimal = dec!(0.0005);

pub(crate) const RECV_WINDOW_MS: u64 = 5000;

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
    status: String,
    contract_type: String,
    base_asset: String,
    quote_asset: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DepthResponse {
    pub(crate) bids: Vec<[String; 2]>,
    pub(crate) asks: Vec<[String; 2]>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PremiumIndex {
    pub(crate) last_funding_rate: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponse {
    order_id: i64,
    client_order_id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: i64,
    msg: String,
}

fn parse_markets(info: ExchangeInfo, taker_fee: Option<Decimal>) -> Vec<MarketInfo> {
    info.symbols
        .into_iter()
        .filter(|s| s.status == "TRADING")
        .map(|s| MarketInfo {
            is_swap: s.contract_type == "PERPETUAL",
            symbol: s.symbol,
            base: s.base_asset,
            quote: s.quote_asset,
            is_contract: true,
            taker_fee,
        })
        .collect()
}

fn parse_book(depth: DepthResponse) -> VenueResult<OrderBook> {
    Ok(OrderBook::new(
        parse_levels(&depth.bids)?,
        parse_levels(&depth.asks)?,
    ))
}

/// Map an HTTP error body of the form `{"code":..,"msg":..}` to a venue error.
pub(crate) fn map_api_error(err: VenueError) -> VenueError {
    match err {
        VenueError::Api { status, body } => match serde_json::from_str::<ErrorBody>(&body) {
            Ok(e) => VenueError::Exchange {
                code: e.code,
                message: e.msg,
            },
            Err(_) => VenueError::Api { status, body },
        },
        other => other,
    }
}

/// Order parameters with `quantity` in the market's order unit.
pub(crate) fn order_params(
    request: &OrderRequest,
    quantity: Decimal,
) -> Vec<(&'static str, String)> {
    let side = match request.side {
        OrderSide::Buy => "BUY",
        OrderSide::Sell => "SELL",
    };
    let mut params = vec![
        ("symbol", request.symbol.clone()),
        ("side", side.to_string()),
        ("newClientOrderId", request.client_order_id.to_string()),
        ("quantity", format_decimal(quantity)),
    ];
    match request.order_type {
        OrderType::Limit => {
            params.push(("type", "LIMIT".to_string()));
            params.push(("price", format_decimal(request.price.inner())));
            params.push(("timeInForce", request.time_in_force.to_string()));
        }
        OrderType::Market => params.push(("type", "MARKET".to_string())),
    }
    params
}

pub(crate) fn encode_query(params: &[(&str, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
        .finish()
}

pub(crate) fn parse_funding_rate(symbol: &str, index: &PremiumIndex) -> VenueResult<Decimal> {
    parse_decimal(&index.last_funding_rate).ok_or_else(|| {
        VenueError::Parse(format!(
            "invalid funding rate for {symbol}: {}",
            index.last_funding_rate
        ))
    })
}

/// Sign `params` and POST them to the order endpoint at `path`.
pub(crate) async fn post_signed_order(
    venue: &VenueId,
    transport: &HttpTransport,
    credentials: &Credentials,
    path: &str,
    mut params: Vec<(&'static str, String)>,
) -> VenueResult<OrderAck> {
    params.push(("recvWindow", RECV_WINDOW_MS.to_string()));
    params.push(("timestamp", timestamp_ms().to_string()));
    let query = encode_query(&params);
    let signature = credentials.sign(&query)?;

    let url = format!("{}?{query}&signature={signature}", transport.url(path));
    let builder = transport
        .client()
        .post(url)
        .header("X-MBX-APIKEY", &credentials.api_key);

    let response: OrderResponse = HttpTransport::send(builder).await.map_err(|e| {
        let e = map_api_error(e);
        warn!(venue = %venue, error = %e, "Order request failed");
        e
    })?;

    Ok(OrderAck {
        order_id: response.order_id.to_string(),
        client_order_id: response.client_order_id.into(),
        status: response.status,
    })
}

// ============================================================================
// Client
// ============================================================================

/// Binance USDⓈ-M futures REST client.
pub struct BinanceUsdm {
    id: VenueId,
    transport: HttpTransport,
    credentials: Option<Credentials>,
    rate_limit: Duration,
    book_depth: u32,
    taker_fee: Option<Decimal>,
    markets: Mutex<Option<Vec<MarketInfo>>>,
}

impl BinanceUsdm {
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
            .get_json("/fapi/v1/exchangeInfo", &[])
            .await
            .map_err(map_api_error)?;
        let markets = parse_markets(info, self.taker_fee);
        debug!(venue = %self.id, count = markets.len(), "Loaded markets");

        *self.markets.lock() = Some(markets.clone());
        Ok(markets)
    }

    async fn fetch_order_book_inner(&self, symbol: &str) -> VenueResult<OrderBook> {
        let depth: DepthResponse = self
            .transport
            .get_json(
                "/fapi/v1/depth",
                &[
                    ("symbol", symbol.to_string()),
                    ("limit", self.book_depth.to_string()),
                ],
            )
            .await
            .map_err(map_api_error)?;
        parse_book(depth)
    }

    async fn fetch_funding_rate_inner(&self, symbol: &str) -> VenueResult<Decimal> {
        let index: PremiumIndex = self
            .transport
            .get_json("/fapi/v1/premiumIndex", &[("symbol", symbol.to_string())])
            .await
            .map_err(map_api_error)?;
        parse_funding_rate(symbol, &index)
    }

    async fn create_order_inner(&self, request: OrderRequest) -> VenueResult<OrderAck> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| VenueError::MissingCredentials(self.id.to_string()))?;

        info!(
            venue = %self.id,
            symbol = %request.symbol,
            side = %request.side,
            amount = %request.amount,
            price = %request.price,
            client_order_id = %request.client_order_id,
            "Submitting order"
        );

        let params = order_params(&request, request.amount.inner());
        post_signed_order(&self.id, &self.transport, credentials, "/fapi/v1/order", params).await
    }
}

impl VenueClient for BinanceUsdm {
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
