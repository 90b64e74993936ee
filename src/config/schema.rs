//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the feeder.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::blockchain::types::OracleParams;

/// Root configuration for the oracle feeder.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FeederConfig {
    /// Chain the votes are submitted to.
    pub target: TargetChainConfig,

    /// Chain the reference exchange rates are read from.
    pub reference: ReferenceChainConfig,

    /// Voter identity (addresses only; the key comes from the environment).
    pub voter: VoterConfig,

    /// Vote cadence and retry intervals.
    pub timing: TimingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Oracle parameters used when the live query fails.
    pub default_params: OracleParams,
}

/// Target chain endpoint and fee settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TargetChainConfig {
    /// LCD (REST) endpoint URL.
    pub lcd_url: String,

    /// Chain ID used in the sign doc.
    pub chain_id: String,

    /// Gas price as `<decimal><denom>` (e.g. "0.01133uluna").
    pub gas_prices: String,

    /// Gas limit attached to every vote transaction.
    pub gas_limit: u64,

    /// LCD request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Broadcast mode passed to the LCD ("sync", "async" or "block").
    pub broadcast_mode: String,
}

impl Default for TargetChainConfig {
    fn default() -> Self {
        Self {
            lcd_url: "http://localhost:1317".to_string(),
            chain_id: "localterra".to_string(),
            gas_prices: "0.01133uluna".to_string(),
            gas_limit: 200_000,
            request_timeout_secs: 10,
            broadcast_mode: "sync".to_string(),
        }
    }
}

/// Reference chain endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReferenceChainConfig {
    /// LCD (REST) endpoint URL.
    pub lcd_url: String,

    /// Chain ID, informational only.
    pub chain_id: String,

    /// LCD request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ReferenceChainConfig {
    fn default() -> Self {
        Self {
            lcd_url: "https://terra-classic-lcd.publicnode.com".to_string(),
            chain_id: "columbus-5".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Voter identity.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct VoterConfig {
    /// Feeder account address (signs and pays for the vote transactions).
    pub feeder_address: String,

    /// Validator operator address the votes are cast for.
    pub validator_address: String,
}

/// Timing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Expected block commit interval in milliseconds.
    pub commit_timeout_ms: u64,

    /// Interval between background rate/parameter refreshes in milliseconds.
    pub refresh_interval_ms: u64,

    /// Per-attempt timeout of the startup TCP probe in milliseconds.
    pub connect_timeout_ms: u64,

    /// Supervisor cooldown, expressed in commit timeouts.
    pub restart_cooldown_commits: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            commit_timeout_ms: 5_000,
            // wider than the block interval to stay clear of upstream rate limits
            refresh_interval_ms: 10_000,
            connect_timeout_ms: 10_000,
            restart_cooldown_commits: 5,
        }
    }
}

impl TimingConfig {
    pub fn commit_timeout(&self) -> Duration {
        Duration::from_millis(self.commit_timeout_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn restart_cooldown(&self) -> Duration {
        self.commit_timeout()
            .saturating_mul(self.restart_cooldown_commits)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9100".to_string(),
        }
    }
}
