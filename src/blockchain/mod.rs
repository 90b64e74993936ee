//! Chain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment (private key) + config (LCD URLs, fee, addresses)
//!     → wallet.rs (key loading, signing, sequence tracking)
//!     → client.rs (LCD queries with timeouts)
//!     → transaction.rs (sign doc, StdTx, broadcast)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All LCD calls have configurable timeouts

pub mod client;
pub mod traits;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::LcdClient;
pub use traits::{Broadcaster, ChainQuery, RateQuery};
pub use transaction::TxSubmitter;
pub use types::{ChainError, ChainResult, ExchangeRate, OracleParams, TxHash};
pub use wallet::Wallet;
