//! Metrics collection and exposition.
//!
//! # Metrics
//! - `feeder_votes_submitted_total` (counter): successful vote transactions
//! - `feeder_broadcast_failures_total` (counter): failed broadcasts
//! - `feeder_block_query_failures_total` (counter): failed latest-block queries
//! - `feeder_feed_refresh_total` (counter): refreshes by `feed` and `outcome`
//! - `feeder_supervisor_restarts_total` (counter): voting cycle restarts
//! - `feeder_last_vote_period` (gauge): period of the last successful vote
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(
            address = %addr,
            error = %e,
            "Failed to install metrics exporter"
        ),
    }
}

pub fn record_vote_submitted(vote_period: u64) {
    metrics::counter!("feeder_votes_submitted_total").increment(1);
    metrics::gauge!("feeder_last_vote_period").set(vote_period as f64);
}

pub fn record_broadcast_failure() {
    metrics::counter!("feeder_broadcast_failures_total").increment(1);
}

pub fn record_block_query_failure() {
    metrics::counter!("feeder_block_query_failures_total").increment(1);
}

/// `feed` is "rates" or "params"; `outcome` is "ok", "kept" or "default".
pub fn record_feed_refresh(feed: &'static str, outcome: &'static str) {
    metrics::counter!("feeder_feed_refresh_total", "feed" => feed, "outcome" => outcome)
        .increment(1);
}

pub fn record_supervisor_restart() {
    metrics::counter!("feeder_supervisor_restarts_total").increment(1);
}
