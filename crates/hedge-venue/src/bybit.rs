//! Bybit v5 linear perpetuals adapter.
//!
//! Every v5 response is wrapped in a `{retCode, retMsg, result}` envelope;
//! a non-zero `retCode` is surfaced as [`VenueError::Exchange`].
//!
//! Signed requests carry `X-BAPI-*` headers where the signature is
//! HMAC-SHA256 over `timestamp + api_key + recv_window + body`.

use std::time::Duration;

use hedge_core::{
    parse_decimal, MarketInfo, OrderAck, OrderBook, OrderRequest, OrderSide, OrderType, VenueId,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::client::{BoxFuture, VenueClient};
use crate::error::{VenueError, VenueResult};
use crate::http::{format_decimal, parse_levels, timestamp_ms, Credentials, HttpTransport};

pub const DEFAULT_BASE_URL: &str = "https://api.bybit.com";
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(20);
pub const DEFAULT_TAKER_FEE: Decimal = dec!(0.00055);

const CATEGORY: &str = "linear";
const RECV_WINDOW_MS: u64 = 5000;
const INSTRUMENTS_PAGE_LIMIT: u32 = 1000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    ret_code: i64,
    ret_msg: String,
    result: Option<T>,
}

impl<T> Envelope<T> {
    fn into_result(self) -> VenueResult<T> {
        if self.ret_code != 0 {
            return Err(VenueError::Exchange {
                code: self.ret_code,
                message: self.ret_msg,
            });
        }
        self.result
            .ok_or_else(|| VenueError::Parse("missing result in response".to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstrumentsPage {
    list: Vec<RawInstrument>,
    #[serde(default)]
    next_page_cursor: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInstrument {
    symbol: String,
    contract_type: String,
    status: String,
    base_coin: String,
    quote_coin: String,
}

#[derive(Debug, Deserialize)]
struct RawOrderBook {
    b: Vec<[String; 2]>,
    a: Vec<[String; 2]>,
}

#[derive(Debug, Deserialize)]
struct TickerList {
    list: Vec<RawTicker>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTicker {
    #[serde(default)]
    funding_rate: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderBody<'a> {
    category: &'static str,
    symbol: &'a str,
    side: &'static str,
    order_type: &'static str,
    qty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_in_force: Option<String>,
    order_link_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderResult {
    order_id: String,
    order_link_id: String,
}

fn to_market(raw: RawInstrument, taker_fee: Option<Decimal>) -> MarketInfo {
    MarketInfo {
        is_swap: raw.contract_type == "LinearPerpetual",
        symbol: raw.symbol,
        base: raw.base_coin,
        quote: raw.quote_coin,
        is_contract: true,
        taker_fee,
    }
}

fn order_body(request: &OrderRequest) -> CreateOrderBody<'_> {
    let side = match request.side {
        OrderSide::Buy => "Buy",
        OrderSide::Sell => "Sell",
    };
    let (order_type, price, time_in_force) = match request.order_type {
        OrderType::Limit => (
            "Limit",
            Some(format_decimal(request.price.inner())),
            Some(request.time_in_force.to_string()),
        ),
        OrderType::Market => ("Market", None, None),
    };
    CreateOrderBody {
        category: CATEGORY,
        symbol: &request.symbol,
        side,
        order_type,
        qty: format_decimal(request.amount.inner()),
        price,
        time_in_force,
        order_link_id: request.client_order_id.as_str(),
    }
}

/// Bybit v5 REST client restricted to the linear category.
pub struct Bybit {
    id: VenueId,
    transport: HttpTransport,
    credentials: Option<Credentials>,
    rate_limit: Duration,
    book_depth: u32,
    taker_fee: Option<Decimal>,
    markets: Mutex<Option<Vec<MarketInfo>>>,
}

impl Bybit {
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
            book_depth: 50,
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

    #[must_use]
    pub fn with_taker_fee(mut self, taker_fee: Option<Decimal>) -> Self {
        self.taker_fee = taker_fee;
        self
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> VenueResult<T> {
        let envelope: Envelope<T> = self.transport.get_json(path, query).await?;
        envelope.into_result()
    }

    async fn load_markets_inner(&self, force_reload: bool) -> VenueResult<Vec<MarketInfo>> {
        if !force_reload {
            let cached = self.markets.lock().clone();
            if let Some(cached) = cached {
                return Ok(cached);
            }
        }

        let mut markets = Vec::new();
        let mut cursor = String::new();
        loop {
            let mut query = vec![
                ("category", CATEGORY.to_string()),
                ("limit", INSTRUMENTS_PAGE_LIMIT.to_string()),
            ];
            if !cursor.is_empty() {
                query.push(("cursor", cursor.clone()));
            }
            let page: InstrumentsPage = self.get("/v5/market/instruments-info", &query).await?;
            markets.extend(
                page.list
                    .into_iter()
                    .filter(|i| i.status == "Trading")
                    .map(|i| to_market(i, self.taker_fee)),
            );
            if page.next_page_cursor.is_empty() || page.next_page_cursor == cursor {
                break;
            }
            cursor = page.next_page_cursor;
        }
        debug!(venue = %self.id, count = markets.len(), "Loaded markets");

        *self.markets.lock() = Some(markets.clone());
        Ok(markets)
    }

    async fn fetch_order_book_inner(&self, symbol: &str) -> VenueResult<OrderBook> {
        let raw: RawOrderBook = self
            .get(
                "/v5/market/orderbook",
                &[
                    ("category", CATEGORY.to_string()),
                    ("symbol", symbol.to_string()),
                    ("limit", self.book_depth.to_string()),
                ],
            )
            .await?;
        Ok(OrderBook::new(parse_levels(&raw.b)?, parse_levels(&raw.a)?))
    }

    async fn fetch_funding_rate_inner(&self, symbol: &str) -> VenueResult<Decimal> {
        let tickers: TickerList = self
            .get(
                "/v5/market/tickers",
                &[
                    ("category", CATEGORY.to_string()),
                    ("symbol", symbol.to_string()),
                ],
            )
            .await?;
        let ticker = tickers
            .list
            .first()
            .ok_or_else(|| VenueError::UnknownSymbol(symbol.to_string()))?;
        parse_decimal(&ticker.funding_rate).ok_or_else(|| {
            VenueError::Parse(format!(
                "invalid funding rate for {symbol}: {:?}",
                ticker.funding_rate
            ))
        })
    }

    async fn create_order_inner(&self, request: OrderRequest) -> VenueResult<OrderAck> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| VenueError::MissingCredentials(self.id.to_string()))?;

        let body = serde_json::to_string(&order_body(&request))?;
        let timestamp = timestamp_ms().to_string();
        let recv_window = RECV_WINDOW_MS.to_string();
        let signature = credentials.sign(&format!(
            "{timestamp}{}{recv_window}{body}",
            credentials.api_key
        ))?;

        info!(
            venue = %self.id,
            symbol = %request.symbol,
            side = %request.side,
            amount = %request.amount,
            price = %request.price,
            client_order_id = %request.client_order_id,
            "Submitting order"
        );

        let builder = self
            .transport
            .client()
            .post(self.transport.url("/v5/order/create"))
            .header("X-BAPI-API-KEY", &credentials.api_key)
            .header("X-BAPI-TIMESTAMP", &timestamp)
            .header("X-BAPI-RECV-WINDOW", &recv_window)
            .header("X-BAPI-SIGN", &signature)
            .header("Content-Type", "application/json")
            .body(body);

        let envelope: Envelope<CreateOrderResult> = HttpTransport::send(builder).await?;
        let result = envelope.into_result().map_err(|e| {
            warn!(venue = %self.id, error = %e, "Order request failed");
            e
        })?;

        Ok(OrderAck {
            order_id: result.order_id,
            client_order_id: result.order_link_id.into(),
            status: "New".to_string(),
        })
    }
}

impl VenueClient for Bybit {
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

#[cfg(test)]
mod tests {
    use super::*;
    use hedge_core::{Price, Size};

    #[test]
    fn test_envelope_error_code() {
        let raw = r#"{"retCode":10001,"retMsg":"params error","result":{},"time":1}"#;
        let env: Envelope<serde_json::Value> = serde_json::from_str(raw).unwrap();
        let err = env.into_result().unwrap_err();
        assert!(matches!(err, VenueError::Exchange { code: 10001, .. }));
    }

    #[test]
    fn test_instruments_page_parse() {
        let raw = r#"{"retCode":0,"retMsg":"OK","result":{
            "category":"linear","nextPageCursor":"",
            "list":[
                {"symbol":"ETHUSDT","contractType":"LinearPerpetual","status":"Trading","baseCoin":"ETH","quoteCoin":"USDT","settleCoin":"USDT"},
                {"symbol":"ETH-27JUN25","contractType":"LinearFutures","status":"Trading","baseCoin":"ETH","quoteCoin":"USDC","settleCoin":"USDC"},
                {"symbol":"ETHPERP","contractType":"LinearPerpetual","status":"PreLaunch","baseCoin":"ETH","quoteCoin":"USDC","settleCoin":"USDC"}
            ]}}"#;
        let env: Envelope<InstrumentsPage> = serde_json::from_str(raw).unwrap();
        let page = env.into_result().unwrap();
        let markets: Vec<_> = page
            .list
            .into_iter()
            .filter(|i| i.status == "Trading")
            .map(|i| to_market(i, None))
            .collect();
        assert_eq!(markets.len(), 2);
        assert!(markets[0].is_perpetual());
        assert!(!markets[1].is_perpetual());
        assert!(markets[0].taker_fee.is_none());
    }

    #[test]
    fn test_orderbook_parse() {
        let raw = r#"{"retCode":0,"retMsg":"OK","result":{
            "s":"ETHUSDT","b":[["2499.9","10"]],"a":[["2500.1","4.5"],["2500.0","1"]],"ts":1,"u":2}}"#;
        let env: Envelope<RawOrderBook> = serde_json::from_str(raw).unwrap();
        let raw = env.into_result().unwrap();
        let book = OrderBook::new(parse_levels(&raw.b).unwrap(), parse_levels(&raw.a).unwrap());
        assert_eq!(book.asks[0].price, Price::new(dec!(2500.0)));
        assert_eq!(book.bids[0].size, Size::new(dec!(10)));
    }

    #[test]
    fn test_order_body_limit() {
        let req = OrderRequest::limit_gtc(
            "ETHUSDT",
            OrderSide::Sell,
            Size::new(dec!(100)),
            Price::new(dec!(2500.10)),
        )
        .unwrap();
        let json = serde_json::to_value(order_body(&req)).unwrap();
        assert_eq!(json["category"], "linear");
        assert_eq!(json["side"], "Sell");
        assert_eq!(json["orderType"], "Limit");
        assert_eq!(json["qty"], "100");
        assert_eq!(json["price"], "2500.1");
        assert_eq!(json["timeInForce"], "GTC");
        assert_eq!(json["orderLinkId"], req.client_order_id.as_str());
    }
}
