//! Prometheus metrics for the hedge engine.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! means duplicate metric names, a fatal configuration error that surfaces at
//! first use during startup.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_histogram, register_int_gauge, Counter,
    CounterVec, Encoder, Histogram, IntGauge, TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Chain state changes that triggered a cycle.
pub static TRIGGERS_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!("hedge_triggers_total", "Chain state changes that triggered a cycle")
        .unwrap()
});

/// Blocks skipped while a cycle was in flight.
pub static TRIGGERS_COALESCED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "hedge_triggers_coalesced_total",
        "Blocks skipped while a cycle was in flight"
    )
    .unwrap()
});

/// Completed cycles.
/// Labels: outcome (completed/chain_failed/hedge_failed/no_viable_venue/observed)
pub static CYCLES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!("hedge_cycles_total", "Cycles by outcome", &["outcome"]).unwrap()
});

/// Cycle duration in milliseconds (trigger to outcome).
pub static CYCLE_DURATION_MS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "hedge_cycle_duration_ms",
        "Cycle duration in milliseconds",
        vec![10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 15000.0, 60000.0]
    )
    .unwrap()
});

/// Failed venue calls.
/// Labels: venue, kind (markets/order_book/funding/order)
pub static VENUE_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "hedge_venue_failures_total",
        "Failed venue calls",
        &["venue", "kind"]
    )
    .unwrap()
});

/// Snapshots gathered in the last aggregation.
pub static SNAPSHOTS_LAST: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "hedge_snapshots_last",
        "Snapshots gathered in the last aggregation"
    )
    .unwrap()
});

/// Venue selections.
pub static SELECTED_VENUE_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "hedge_selected_venue_total",
        "Times each venue was selected",
        &["venue"]
    )
    .unwrap()
});

/// Chain leg results.
/// Labels: result (confirmed/failed)
pub static CHAIN_TX_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!("hedge_chain_tx_total", "Chain leg results", &["result"]).unwrap()
});

/// Hedge order results.
/// Labels: venue, result (accepted/failed)
pub static HEDGE_ORDERS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "hedge_orders_total",
        "Hedge order results",
        &["venue", "result"]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    pub fn trigger() {
        TRIGGERS_TOTAL.inc();
    }

    /// Record blocks skipped while a cycle was running.
    pub fn triggers_coalesced(blocks: u64) {
        TRIGGERS_COALESCED_TOTAL.inc_by(blocks as f64);
    }

    pub fn cycle_finished(outcome: &str, duration_ms: f64) {
        CYCLES_TOTAL.with_label_values(&[outcome]).inc();
        CYCLE_DURATION_MS.observe(duration_ms);
    }

    pub fn venue_failure(venue: &str, kind: &str) {
        VENUE_FAILURES_TOTAL.with_label_values(&[venue, kind]).inc();
    }

    pub fn snapshots(count: usize) {
        SNAPSHOTS_LAST.set(count as i64);
    }

    pub fn venue_selected(venue: &str) {
        SELECTED_VENUE_TOTAL.with_label_values(&[venue]).inc();
    }

    pub fn chain_tx(confirmed: bool) {
        let result = if confirmed { "confirmed" } else { "failed" };
        CHAIN_TX_TOTAL.with_label_values(&[result]).inc();
    }

    pub fn hedge_order(venue: &str, accepted: bool) {
        let result = if accepted { "accepted" } else { "failed" };
        HEDGE_ORDERS_TOTAL.with_label_values(&[venue, result]).inc();
    }

    /// Render all registered metrics in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_recorded_metrics() {
        Metrics::cycle_finished("completed", 120.0);
        Metrics::venue_failure("bybit", "funding");
        Metrics::hedge_order("binanceusdm", true);
        Metrics::triggers_coalesced(3);

        let text = Metrics::render().unwrap();
        assert!(text.contains("hedge_cycles_total{outcome=\"completed\"}"));
        assert!(text.contains("hedge_venue_failures_total{"));
        assert!(text.contains("venue=\"bybit\""));
        assert!(text.contains("hedge_orders_total"));
        assert!(text.contains("hedge_triggers_coalesced_total"));
        assert!(text.contains("hedge_cycle_duration_ms_bucket"));
    }

    #[test]
    fn test_counters_accumulate() {
        let before = CHAIN_TX_TOTAL.with_label_values(&["failed"]).get();
        Metrics::chain_tx(false);
        Metrics::chain_tx(false);
        let after = CHAIN_TX_TOTAL.with_label_values(&["failed"]).get();
        assert!(after - before >= 2.0);
    }
}
