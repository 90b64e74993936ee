//! Chain-specific types and error definitions.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

// Re-export endpoint configs from config module to avoid duplication
pub use crate::config::schema::{ReferenceChainConfig, TargetChainConfig};

/// Block height as reported by the chain.
pub type BlockHeight = u64;

/// Transaction hash returned by a successful broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single reference exchange rate, e.g. `{ denom: "uusd", amount: "0.0012" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub denom: String,
    /// Decimal string exactly as the reference chain reported it.
    pub amount: String,
}

impl ExchangeRate {
    pub fn new(denom: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }
}

/// Whitelisted denomination entry of the oracle parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denom {
    pub name: String,
    #[serde(default)]
    pub tobin_tax: String,
}

/// Oracle module parameters of the target chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleParams {
    /// Vote period length in blocks. The LCD encodes it as a string,
    /// genesis files sometimes as a number; both are accepted.
    #[serde(deserialize_with = "de_u64_from_str_or_num")]
    pub vote_period: u64,
    #[serde(default)]
    pub vote_threshold: String,
    #[serde(default)]
    pub reward_band: String,
    #[serde(default)]
    pub reward_distribution_window: String,
    #[serde(default)]
    pub whitelist: Vec<Denom>,
    #[serde(default)]
    pub slash_fraction: String,
    #[serde(default)]
    pub slash_window: String,
    #[serde(default)]
    pub min_valid_per_window: String,
}

impl OracleParams {
    /// Whitelisted denoms as a set, for membership tests.
    pub fn whitelist_set(&self) -> BTreeSet<&str> {
        self.whitelist.iter().map(|d| d.name.as_str()).collect()
    }
}

impl Default for OracleParams {
    /// Genesis parameters used whenever the live query fails.
    fn default() -> Self {
        let denom = |name: &str| Denom {
            name: name.to_string(),
            tobin_tax: "0.002500000000000000".to_string(),
        };
        Self {
            vote_period: 5,
            vote_threshold: "0.500000000000000000".to_string(),
            reward_band: "0.120000000000000000".to_string(),
            reward_distribution_window: "15768000".to_string(),
            whitelist: vec![denom("ukrw"), denom("usdr"), denom("uusd"), denom("ueur")],
            slash_fraction: "0.000100000000000000".to_string(),
            slash_window: "432000".to_string(),
            min_valid_per_window: "0.050000000000000000".to_string(),
        }
    }
}

fn de_u64_from_str_or_num<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StrOrNum {
        Num(u64),
        Float(f64),
        Str(String),
    }

    match StrOrNum::deserialize(deserializer)? {
        StrOrNum::Num(n) => Ok(n),
        StrOrNum::Float(f) if f >= 0.0 && f.fract() == 0.0 => Ok(f as u64),
        StrOrNum::Float(f) => Err(serde::de::Error::custom(format!(
            "vote_period must be a whole number, got {}",
            f
        ))),
        StrOrNum::Str(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid vote_period '{}': {}", s, e))),
    }
}

/// Errors that can occur during chain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// HTTP transport failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("LCD returned status {status} for {path}")]
    Status { status: u16, path: String },

    /// Response body did not have the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The chain accepted the request but rejected the transaction.
    #[error("Transaction rejected with code {code}: {log}")]
    Rejected { code: u32, log: String },

    /// Invalid private key format or signing failure.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Endpoint URL could not be parsed.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;
