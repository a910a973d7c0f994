//! Structured logging initialization.

use crate::error::{TelemetryError, TelemetryResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directive used when `RUST_LOG` is unset, at the given base level.
fn default_directive(level: &str) -> String {
    format!("{level},hedge=debug")
}

/// Initialize structured logging.
///
/// `RUST_LOG` wins over `level`. Output is JSON when `RUST_ENV=production`
/// and pretty otherwise. Fails if a global subscriber is already set.
pub fn init_logging(level: &str) -> TelemetryResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(level)))
        .map_err(|e| TelemetryError::LoggingInit(format!("invalid log level {level:?}: {e}")))?;

    let is_production = std::env::var("RUST_ENV")
        .map(|v| v == "production")
        .unwrap_or(false);

    let result = if is_production {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_names(true),
            )
            .try_init()
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive("warn"), "warn,hedge=debug");
        assert!(EnvFilter::try_new(default_directive("info")).is_ok());
    }
}
