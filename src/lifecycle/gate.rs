//! Startup connectivity gate.
//!
//! # Responsibilities
//! - Wait until the target endpoint accepts TCP connections
//! - Then wait until the chain reports a block with height > 0
//!
//! Neither phase gives up; both retry on a fixed interval. The gate only
//! delays the start of a voting cycle and never fails it.

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

use crate::blockchain::traits::ChainQuery;
use crate::blockchain::types::BlockHeight;
use crate::config::validation::Endpoint;

pub struct ConnectivityGate {
    endpoint: Endpoint,
    chain: Arc<dyn ChainQuery>,
    connect_timeout: Duration,
    poll_interval: Duration,
}

impl ConnectivityGate {
    pub fn new(
        endpoint: Endpoint,
        chain: Arc<dyn ChainQuery>,
        connect_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            endpoint,
            chain,
            connect_timeout,
            poll_interval,
        }
    }

    /// Block until the chain is reachable and producing blocks; returns the
    /// first non-zero height observed.
    pub async fn wait_until_live(&self) -> BlockHeight {
        self.wait_for_connectivity().await;
        self.wait_for_first_block().await
    }

    async fn wait_for_connectivity(&self) {
        tracing::info!(
            host = %self.endpoint.host,
            port = self.endpoint.port,
            "Waiting for connectivity"
        );

        let target = (self.endpoint.host.as_str(), self.endpoint.port);
        loop {
            match timeout(self.connect_timeout, TcpStream::connect(target)).await {
                Ok(Ok(_stream)) => break,
                Ok(Err(e)) => {
                    tracing::debug!(error = %e, "Endpoint not reachable yet");
                }
                Err(_) => {
                    tracing::debug!(
                        timeout_ms = self.connect_timeout.as_millis() as u64,
                        "Connection attempt timed out"
                    );
                }
            }
            sleep(self.poll_interval).await;
        }

        tracing::info!("Endpoint reachable");
    }

    async fn wait_for_first_block(&self) -> BlockHeight {
        tracing::info!("Waiting for first block");

        loop {
            sleep(self.poll_interval).await;
            match self.chain.latest_block_height().await {
                Ok(height) if height > 0 => {
                    tracing::info!(height, "Chain is producing blocks");
                    return height;
                }
                Ok(_) => tracing::debug!("Chain at genesis, no block committed yet"),
                Err(e) => tracing::warn!(error = %e, "Failed to get latest block"),
            }
        }
    }
}
