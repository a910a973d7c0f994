//! Pricing configuration.

use hedge_core::{HedgeDirection, OrderSide, Size};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{PricingError, PricingResult};

/// Policy constants of the cost model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostPolicy {
    /// Fee-equivalent events charged per day of holding. Default: 3.
    #[serde(default = "default_fee_events_per_day")]
    pub fee_events_per_day: Decimal,
    /// Funding periods applied to the rate (plain multiplier). Default: 1.
    #[serde(default = "default_funding_periods")]
    pub funding_periods: Decimal,
}

fn default_fee_events_per_day() -> Decimal {
    Decimal::from(3)
}

fn default_funding_periods() -> Decimal {
    Decimal::ONE
}

impl Default for CostPolicy {
    fn default() -> Self {
        Self {
            fee_events_per_day: default_fee_events_per_day(),
            funding_periods: default_funding_periods(),
        }
    }
}

/// What to hedge and how to price it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Hedge amount in base-asset units. Default: 100.
    #[serde(default = "default_amount")]
    pub amount: Decimal,
    /// Exposure of the hedge position. Default: short.
    #[serde(default = "default_direction")]
    pub direction: HedgeDirection,
    /// Forecast holding horizon in days. Default: 2.
    #[serde(default = "default_horizon_days")]
    pub horizon_days: Decimal,
    /// Book side walked by the fill simulation: buy walks asks. Default: buy.
    #[serde(default = "default_fill_side")]
    pub fill_side: OrderSide,
    #[serde(flatten)]
    pub policy: CostPolicy,
}

fn default_amount() -> Decimal {
    Decimal::from(100)
}

fn default_direction() -> HedgeDirection {
    HedgeDirection::Short
}

fn default_horizon_days() -> Decimal {
    Decimal::from(2)
}

fn default_fill_side() -> OrderSide {
    OrderSide::Buy
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            amount: default_amount(),
            direction: default_direction(),
            horizon_days: default_horizon_days(),
            fill_side: default_fill_side(),
            policy: CostPolicy::default(),
        }
    }
}

impl PricingConfig {
    pub fn target(&self) -> Size {
        Size::new(self.amount)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> PricingResult<()> {
        if self.amount <= Decimal::ZERO {
            return Err(PricingError::Config(format!(
                "pricing.amount ({}) must be positive",
                self.amount
            )));
        }
        if self.horizon_days <= Decimal::ZERO {
            return Err(PricingError::Config(format!(
                "pricing.horizon_days ({}) must be positive",
                self.horizon_days
            )));
        }
        if self.policy.fee_events_per_day.is_sign_negative() {
            return Err(PricingError::Config(format!(
                "pricing.fee_events_per_day ({}) must be non-negative",
                self.policy.fee_events_per_day
            )));
        }
        if self.policy.funding_periods.is_sign_negative() {
            return Err(PricingError::Config(format!(
                "pricing.funding_periods ({}) must be non-negative",
                self.policy.funding_periods
            )));
        }
        Ok(())
    }
}
