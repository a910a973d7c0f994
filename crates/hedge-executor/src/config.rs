//! Execution configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ExecutorError, ExecutorResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Upper bound on waiting for the swap receipt (ms). Default: 120000.
    #[serde(default = "default_confirmation_timeout_ms")]
    pub confirmation_timeout_ms: u64,
    /// Upper bound on the hedge order call (ms). Default: 10000.
    #[serde(default = "default_order_timeout_ms")]
    pub order_timeout_ms: u64,
}

fn default_confirmation_timeout_ms() -> u64 {
    120_000
}

fn default_order_timeout_ms() -> u64 {
    10_000
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout_ms: default_confirmation_timeout_ms(),
            order_timeout_ms: default_order_timeout_ms(),
        }
    }
}

impl ExecutionConfig {
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_millis(self.confirmation_timeout_ms)
    }

    pub fn order_timeout(&self) -> Duration {
        Duration::from_millis(self.order_timeout_ms)
    }

    pub fn validate(&self) -> ExecutorResult<()> {
        if self.confirmation_timeout_ms == 0 {
            return Err(ExecutorError::Config(
                "execution.confirmation_timeout_ms must be > 0".to_string(),
            ));
        }
        if self.order_timeout_ms == 0 {
            return Err(ExecutorError::Config(
                "execution.order_timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
