//! Aggregation settings.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{FeedError, FeedResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Upper bound on any single venue call (ms). Default: 10,000.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Reload market listings on every aggregation. Default: true.
    #[serde(default = "default_force_reload_markets")]
    pub force_reload_markets: bool,
    /// Price band from the best level used for depth reporting (bps). Default: 50.
    #[serde(default = "default_depth_band_bps")]
    pub depth_band_bps: u32,
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_force_reload_markets() -> bool {
    true
}

fn default_depth_band_bps() -> u32 {
    50
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            force_reload_markets: default_force_reload_markets(),
            depth_band_bps: default_depth_band_bps(),
        }
    }
}

impl FeedConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn depth_band(&self) -> Decimal {
        Decimal::from(self.depth_band_bps)
    }

    pub fn validate(&self) -> FeedResult<()> {
        if self.request_timeout_ms == 0 {
            return Err(FeedError::Config(
                "feed.request_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
