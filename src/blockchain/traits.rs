//! Collaborator seams consumed by the voting core.
//!
//! The core never talks to an HTTP client directly; it is written against
//! these traits so tests can substitute scripted chains.

use async_trait::async_trait;

use crate::blockchain::types::{BlockHeight, ChainResult, ExchangeRate, OracleParams, TxHash};
use crate::voting::message::OracleMsg;

/// Read access to the chain votes are submitted to.
#[async_trait]
pub trait ChainQuery: Send + Sync {
    /// Height of the latest committed block.
    async fn latest_block_height(&self) -> ChainResult<BlockHeight>;

    /// Current oracle module parameters.
    async fn oracle_params(&self) -> ChainResult<OracleParams>;
}

/// Source of reference exchange rates.
#[async_trait]
pub trait RateQuery: Send + Sync {
    async fn exchange_rates(&self) -> ChainResult<Vec<ExchangeRate>>;
}

/// Signs and broadcasts a message list as one transaction.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn broadcast(&self, msgs: &[OracleMsg]) -> ChainResult<TxHash>;
}
