//! Application configuration.

use std::path::Path;

use hedge_chain::ChainConfig;
use hedge_executor::ExecutionConfig;
use hedge_feed::{FeedConfig, SymbolFilter};
use hedge_pricing::PricingConfig;
use hedge_venue::{VenueConfig, VenueKind};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    /// Compute and log decisions, never execute.
    #[default]
    Observation,
    /// Execute the swap and the hedge order.
    Trading,
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub mode: OperatingMode,
    #[serde(default)]
    pub chain: ChainConfig,
    /// Venues to aggregate. Default: Binance USD-M and Bybit linear.
    #[serde(default = "default_venues")]
    pub venues: Vec<VenueConfig>,
    #[serde(default)]
    pub filter: SymbolFilter,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_venues() -> Vec<VenueConfig> {
    vec![
        VenueConfig::new(VenueKind::BinanceUsdm),
        VenueConfig::new(VenueKind::BinanceCoinm),
        VenueConfig::new(VenueKind::Bybit),
    ]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: OperatingMode::default(),
            chain: ChainConfig::default(),
            venues: default_venues(),
            filter: SymbolFilter::default(),
            feed: FeedConfig::default(),
            pricing: PricingConfig::default(),
            execution: ExecutionConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// Env vars that override chain endpoint and contract settings.
pub const ENV_RPC_URL: &str = "HEDGE_RPC_URL";
pub const ENV_ROUTER_ADDRESS: &str = "HEDGE_ROUTER_ADDRESS";
pub const ENV_TOKEN_IN: &str = "HEDGE_TOKEN_IN";
pub const ENV_TOKEN_OUT: &str = "HEDGE_TOKEN_OUT";

impl AppConfig {
    /// Load from `path`. `None` when the file does not exist.
    ///
    /// Callers fall back to defaults and report it once logging is up.
    pub fn load(path: &str) -> AppResult<Option<Self>> {
        if Path::new(path).exists() {
            Self::from_file(path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Apply `HEDGE_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from `lookup`. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let targets = [
            (ENV_RPC_URL, &mut self.chain.rpc_url),
            (ENV_ROUTER_ADDRESS, &mut self.chain.router_address),
            (ENV_TOKEN_IN, &mut self.chain.token_in),
            (ENV_TOKEN_OUT, &mut self.chain.token_out),
        ];
        for (name, slot) in targets {
            if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
                tracing::debug!(var = name, "Config override from environment");
                *slot = value;
            }
        }
    }

    pub fn is_observation_mode(&self) -> bool {
        self.mode == OperatingMode::Observation
    }

    /// Validate every section.
    ///
    /// Chain addresses are checked when the chain client is built, since a
    /// one-shot decision run never touches the chain.
    pub fn validate(&self) -> AppResult<()> {
        self.pricing.validate()?;
        self.feed.validate()?;
        self.execution.validate()?;
        for venue in &self.venues {
            venue.validate()?;
        }
        if self.mode == OperatingMode::Trading && self.venues.is_empty() {
            return Err(AppError::Config(
                "trading mode requires at least one venue".to_string(),
            ));
        }
        if self.chain.poll_interval_ms == 0 {
            return Err(AppError::Config("chain.poll_interval_ms must be > 0".to_string()));
        }
        Ok(())
    }
}
