//! Shared HTTP plumbing for REST venue adapters.
//!
//! Provides the JSON transport with a bounded request timeout, HMAC-SHA256
//! request signing, and helpers for the `[price, size]` string pairs every
//! supported venue uses for order book levels.

use std::fmt;
use std::time::Duration;

use hedge_core::{parse_decimal, OrderBookLevel, Price, Size};
use hmac::{Hmac, Mac};
use reqwest::{Client, RequestBuilder};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use tracing::trace;

use crate::error::{VenueError, VenueResult};

type HmacSha256 = Hmac<Sha256>;

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON-over-HTTP transport bound to one venue base URL.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> VenueResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VenueError::Http(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Underlying client, for requests that need custom headers.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// GET `path` with query parameters and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> VenueResult<T> {
        trace!(url = %self.url(path), "GET");
        let request = self.client.get(self.url(path)).query(query);
        Self::send(request).await
    }

    /// Send a prepared request, map non-2xx statuses and decode the body.
    pub async fn send<T: DeserializeOwned>(request: RequestBuilder) -> VenueResult<T> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VenueError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// API key pair for signed endpoints.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Read credentials from the named environment variables.
    ///
    /// Returns `None` if either variable is unset or blank.
    pub fn from_env(key_var: &str, secret_var: &str) -> Option<Self> {
        let api_key = std::env::var(key_var).ok().filter(|v| !v.trim().is_empty())?;
        let api_secret = std::env::var(secret_var)
            .ok()
            .filter(|v| !v.trim().is_empty())?;
        Some(Self::new(api_key, api_secret))
    }

    /// Hex-encoded HMAC-SHA256 of `payload` keyed with the API secret.
    pub fn sign(&self, payload: &str) -> VenueResult<String> {
        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes())
            .map_err(|e| VenueError::Signing(e.to_string()))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Parse `[price, size]` string pairs into book levels.
pub fn parse_levels(raw: &[[String; 2]]) -> VenueResult<Vec<OrderBookLevel>> {
    raw.iter()
        .map(|[price, size]| {
            let price = parse_decimal(price)
                .ok_or_else(|| VenueError::Parse(format!("invalid level price: {price}")))?;
            let size = parse_decimal(size)
                .ok_or_else(|| VenueError::Parse(format!("invalid level size: {size}")))?;
            Ok(OrderBookLevel::new(Price::new(price), Size::new(size)))
        })
        .collect()
}

/// Render a decimal for a request parameter (no trailing zeros).
pub fn format_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Milliseconds since the Unix epoch, as used by signed endpoints.
pub fn timestamp_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
