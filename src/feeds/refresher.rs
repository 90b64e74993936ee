//! Background refresh of exchange rates and oracle parameters.
//!
//! # Failure policy
//! - Rates: first fetch must succeed; later failures keep the previous snapshot
//! - Params: any failure substitutes the configured default parameters
//!
//! The refresher is owned by one voting cycle. Dropping its `RefreshTask`
//! aborts the timer, so a restarted cycle never leaves a stale task behind.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::blockchain::traits::{ChainQuery, RateQuery};
use crate::blockchain::types::{ChainResult, OracleParams};
use crate::feeds::snapshot::FeedSnapshot;
use crate::observability::metrics;

pub struct FeedRefresher {
    rates: Arc<dyn RateQuery>,
    chain: Arc<dyn ChainQuery>,
    default_params: OracleParams,
    feeds: Arc<FeedSnapshot>,
}

/// Handle to a running refresh loop; aborts it on drop.
#[derive(Debug)]
pub struct RefreshTask(JoinHandle<()>);

impl Drop for RefreshTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl FeedRefresher {
    /// Fetch the initial snapshot.
    ///
    /// Fails only when the reference rates cannot be fetched; parameters fall
    /// back to `default_params`.
    pub async fn initialize(
        rates: Arc<dyn RateQuery>,
        chain: Arc<dyn ChainQuery>,
        default_params: OracleParams,
    ) -> ChainResult<Self> {
        let (initial_rates, params) = tokio::join!(
            rates.exchange_rates(),
            fetch_params(chain.as_ref(), &default_params)
        );
        let initial_rates = initial_rates?;
        metrics::record_feed_refresh("rates", "ok");

        tracing::info!(
            rates = initial_rates.len(),
            vote_period = params.vote_period,
            whitelist = params.whitelist.len(),
            "Initial feed snapshot loaded"
        );

        Ok(Self {
            rates,
            chain,
            default_params,
            feeds: Arc::new(FeedSnapshot::new(initial_rates, params)),
        })
    }

    /// Shared snapshot read by the vote engine.
    pub fn feeds(&self) -> Arc<FeedSnapshot> {
        self.feeds.clone()
    }

    /// Refresh both feeds once.
    pub async fn refresh_once(&self) {
        let (rates, params) = tokio::join!(
            self.rates.exchange_rates(),
            fetch_params(self.chain.as_ref(), &self.default_params)
        );

        match rates {
            Ok(rates) => {
                tracing::debug!(rates = rates.len(), "Exchange rates refreshed");
                self.feeds.store_rates(rates);
                metrics::record_feed_refresh("rates", "ok");
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Failed to refresh exchange rates, keeping previous snapshot"
                );
                metrics::record_feed_refresh("rates", "kept");
            }
        }
        self.feeds.store_params(params);
    }

    /// Run the refresh loop on a fixed interval in a background task.
    ///
    /// The first tick fires one interval from now; the initial snapshot is
    /// already loaded.
    pub fn spawn(self, every: Duration) -> RefreshTask {
        RefreshTask(tokio::spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.refresh_once().await;
            }
        }))
    }
}

/// Query the oracle parameters, substituting `default` on failure.
async fn fetch_params(chain: &dyn ChainQuery, default: &OracleParams) -> OracleParams {
    match chain.oracle_params().await {
        Ok(params) if params.vote_period > 0 => {
            metrics::record_feed_refresh("params", "ok");
            params
        }
        Ok(_) => {
            tracing::warn!("Chain reported vote_period 0, using default oracle params");
            metrics::record_feed_refresh("params", "default");
            default.clone()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to get oracle params, using default");
            metrics::record_feed_refresh("params", "default");
            default.clone()
        }
    }
}
