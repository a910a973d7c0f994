//! Venue configuration and adapter factory.

use std::sync::Arc;
use std::time::Duration;

use hedge_core::VenueId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::binance::{self, BinanceUsdm};
use crate::binance_coinm::{self, BinanceCoinm};
use crate::bybit::{self, Bybit};
use crate::client::DynVenueClient;
use crate::error::{VenueError, VenueResult};
use crate::http::Credentials;

/// Supported venue adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueKind {
    /// Binance USDⓈ-M futures.
    BinanceUsdm,
    /// Binance COIN-M (coin-margined, USD-quoted) futures.
    BinanceCoinm,
    /// Bybit v5 linear perpetuals.
    Bybit,
}

impl VenueKind {
    fn default_base_url(&self) -> &'static str {
        match self {
            Self::BinanceUsdm => binance::DEFAULT_BASE_URL,
            Self::BinanceCoinm => binance_coinm::DEFAULT_BASE_URL,
            Self::Bybit => bybit::DEFAULT_BASE_URL,
        }
    }

    fn default_rate_limit(&self) -> Duration {
        match self {
            Self::BinanceUsdm => binance::DEFAULT_RATE_LIMIT,
            Self::BinanceCoinm => binance_coinm::DEFAULT_RATE_LIMIT,
            Self::Bybit => bybit::DEFAULT_RATE_LIMIT,
        }
    }

    fn default_taker_fee(&self) -> Decimal {
        match self {
            Self::BinanceUsdm => binance::DEFAULT_TAKER_FEE,
            Self::BinanceCoinm => binance_coinm::DEFAULT_TAKER_FEE,
            Self::Bybit => bybit::DEFAULT_TAKER_FEE,
        }
    }

    fn default_book_depth(&self) -> u32 {
        match self {
            Self::BinanceUsdm | Self::BinanceCoinm => 100,
            Self::Bybit => 50,
        }
    }
}

/// One `[[venues]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    /// Adapter to use.
    pub kind: VenueKind,
    /// Identifier used in logs and decisions. Defaults to the kind name.
    #[serde(default)]
    pub id: Option<String>,
    /// REST base URL. Defaults to the venue's production endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Minimum spacing between calls (ms). Defaults to the venue's published limit.
    #[serde(default)]
    pub rate_limit_ms: Option<u64>,
    /// Per-request HTTP timeout (ms). Default: 10,000.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Order book levels requested per fetch.
    #[serde(default)]
    pub book_depth: Option<u32>,
    /// Taker fee override as a fraction (0.0005 = 5 bps).
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub taker_fee: Option<Decimal>,
    /// Report no taker fee for this venue's markets.
    #[serde(default)]
    pub omit_taker_fee: bool,
    /// Env var holding the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Env var holding the API secret.
    #[serde(default)]
    pub api_secret_env: Option<String>,
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl VenueConfig {
    /// Minimal config for `kind` with every optional field defaulted.
    pub fn new(kind: VenueKind) -> Self {
        Self {
            kind,
            id: None,
            base_url: None,
            rate_limit_ms: None,
            request_timeout_ms: default_request_timeout_ms(),
            book_depth: None,
            taker_fee: None,
            omit_taker_fee: false,
            api_key_env: None,
            api_secret_env: None,
        }
    }

    /// Resolved venue identifier.
    pub fn venue_id(&self) -> VenueId {
        match &self.id {
            Some(id) => VenueId::new(id.clone()),
            None => VenueId::new(match self.kind {
                VenueKind::BinanceUsdm => "binanceusdm",
                VenueKind::BinanceCoinm => "binancecoinm",
                VenueKind::Bybit => "bybit",
            }),
        }
    }

    /// Resolved taker fee: `None` if omitted, else the override or venue default.
    pub fn effective_taker_fee(&self) -> Option<Decimal> {
        if self.omit_taker_fee {
            None
        } else {
            Some(self.taker_fee.unwrap_or_else(|| self.kind.default_taker_fee()))
        }
    }

    pub fn rate_limit(&self) -> Duration {
        self.rate_limit_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.kind.default_rate_limit())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Env var names for the API key pair, defaulting to `{ID}_API_KEY` / `{ID}_API_SECRET`.
    pub fn credential_env_vars(&self) -> (String, String) {
        let prefix = self.venue_id().as_str().to_ascii_uppercase().replace('-', "_");
        (
            self.api_key_env
                .clone()
                .unwrap_or_else(|| format!("{prefix}_API_KEY")),
            self.api_secret_env
                .clone()
                .unwrap_or_else(|| format!("{prefix}_API_SECRET")),
        )
    }

    pub fn validate(&self) -> VenueResult<()> {
        if self.request_timeout_ms == 0 {
            return Err(VenueError::Config(format!(
                "{}: request_timeout_ms must be positive",
                self.venue_id()
            )));
        }
        if let Some(fee) = self.taker_fee {
            if fee.is_sign_negative() {
                return Err(VenueError::Config(format!(
                    "{}: taker_fee must not be negative",
                    self.venue_id()
                )));
            }
        }
        if self.book_depth == Some(0) {
            return Err(VenueError::Config(format!(
                "{}: book_depth must be positive",
                self.venue_id()
            )));
        }
        Ok(())
    }
}

/// Build a venue client from configuration.
///
/// Credentials are optional: market data works without them, order placement
/// then fails with [`VenueError::MissingCredentials`].
pub fn build_venue(config: &VenueConfig) -> VenueResult<DynVenueClient> {
    config.validate()?;

    let id = config.venue_id();
    let base_url = config
        .base_url
        .clone()
        .unwrap_or_else(|| config.kind.default_base_url().to_string());
    let (key_var, secret_var) = config.credential_env_vars();
    let credentials = Credentials::from_env(&key_var, &secret_var);
    if credentials.is_none() {
        warn!(venue = %id, key_var = %key_var, "No API credentials found, order placement disabled");
    }
    let depth = config
        .book_depth
        .unwrap_or_else(|| config.kind.default_book_depth());

    info!(
        venue = %id,
        kind = ?config.kind,
        base_url = %base_url,
        rate_limit_ms = config.rate_limit().as_millis() as u64,
        "Building venue client"
    );

    let client: DynVenueClient = match config.kind {
        VenueKind::BinanceUsdm => Arc::new(
            BinanceUsdm::new(id, base_url, config.request_timeout())?
                .with_credentials(credentials)
                .with_rate_limit(config.rate_limit())
                .with_book_depth(depth)
                .with_taker_fee(config.effective_taker_fee()),
        ),
        VenueKind::BinanceCoinm => Arc::new(
            BinanceCoinm::new(id, base_url, config.request_timeout())?
                .with_credentials(credentials)
                .with_rate_limit(config.rate_limit())
                .with_book_depth(depth)
                .with_taker_fee(config.effective_taker_fee()),
        ),
        VenueKind::Bybit => Arc::new(
            Bybit::new(id, base_url, config.request_timeout())?
                .with_credentials(credentials)
                .with_rate_limit(config.rate_limit())
                .with_book_depth(depth)
                .with_taker_fee(config.effective_taker_fee()),
        ),
    };
    Ok(client)
}
