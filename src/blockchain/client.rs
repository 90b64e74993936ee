//! LCD (REST) client with timeout and error handling.
//!
//! # Responsibilities
//! - Query chain state (latest block, oracle params, exchange rates, accounts)
//! - Broadcast signed amino-JSON transactions
//! - Map transport, status and decode failures onto `ChainError`

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::blockchain::traits::{ChainQuery, RateQuery};
use crate::blockchain::types::{
    BlockHeight, ChainError, ChainResult, ExchangeRate, OracleParams, TxHash,
};

const LATEST_BLOCK_PATH: &str = "cosmos/base/tendermint/v1beta1/blocks/latest";
const ORACLE_PARAMS_PATH: &str = "terra/oracle/v1beta1/params";
const EXCHANGE_RATES_PATH: &str = "terra/oracle/v1beta1/denoms/exchange_rates";
const ACCOUNTS_PATH: &str = "cosmos/auth/v1beta1/accounts";
const BROADCAST_PATH: &str = "txs";

/// Account number and sequence needed to sign a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountInfo {
    pub account_number: u64,
    pub sequence: u64,
}

#[derive(Deserialize)]
struct LatestBlockResponse {
    block: BlockBody,
}

#[derive(Deserialize)]
struct BlockBody {
    header: BlockHeader,
}

#[derive(Deserialize)]
struct BlockHeader {
    height: String,
}

#[derive(Deserialize)]
struct ParamsResponse {
    params: OracleParams,
}

#[derive(Deserialize)]
struct ExchangeRatesResponse {
    exchange_rates: Vec<ExchangeRate>,
}

#[derive(Deserialize)]
struct AccountResponse {
    account: AccountBody,
}

#[derive(Deserialize)]
struct AccountBody {
    #[serde(default)]
    account_number: Option<String>,
    #[serde(default)]
    sequence: Option<String>,
}

#[derive(Deserialize)]
struct BroadcastResponse {
    #[serde(default)]
    txhash: String,
    #[serde(default)]
    code: Option<u32>,
    #[serde(default)]
    raw_log: String,
}

/// Thin LCD client bound to one endpoint.
#[derive(Clone)]
pub struct LcdClient {
    http: Client,
    base_url: Url,
}

impl LcdClient {
    /// Create a new client for the given LCD URL.
    ///
    /// No request is made here; reachability is the connectivity gate's job.
    pub fn new(lcd_url: &str, timeout_secs: u64) -> ChainResult<Self> {
        let mut base_url: Url = lcd_url.parse().map_err(|e: url::ParseError| {
            ChainError::InvalidUrl {
                url: lcd_url.to_string(),
                reason: e.to_string(),
            }
        })?;
        // Url::join drops the last segment unless the base ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        tracing::debug!(lcd_url = %base_url, timeout_secs, "LCD client initialized");

        Ok(Self { http, base_url })
    }

    /// Base URL of the endpoint.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> ChainResult<Url> {
        self.base_url.join(path).map_err(|e| ChainError::InvalidUrl {
            url: format!("{}{}", self.base_url, path),
            reason: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ChainResult<T> {
        let response = self.http.get(self.endpoint(path)?).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ChainError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ChainError::Decode(format!("{}: {}", path, e)))
    }

    /// Fetch account number and sequence for an address.
    pub async fn account(&self, address: &str) -> ChainResult<AccountInfo> {
        let path = format!("{}/{}", ACCOUNTS_PATH, address);
        let response: AccountResponse = self.get_json(&path).await?;
        let parse = |field: &str, value: Option<String>| -> ChainResult<u64> {
            value
                .unwrap_or_else(|| "0".to_string())
                .parse()
                .map_err(|e| ChainError::Decode(format!("account {}: {}", field, e)))
        };
        Ok(AccountInfo {
            account_number: parse("account_number", response.account.account_number)?,
            sequence: parse("sequence", response.account.sequence)?,
        })
    }

    /// Broadcast a signed transaction body.
    ///
    /// A response with a non-zero `code` is a rejection, not a success.
    pub async fn broadcast_tx(&self, body: &serde_json::Value) -> ChainResult<TxHash> {
        let response = self
            .http
            .post(self.endpoint(BROADCAST_PATH)?)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ChainError::Status {
                status: status.as_u16(),
                path: BROADCAST_PATH.to_string(),
            });
        }
        let body = response.bytes().await?;
        let result: BroadcastResponse = serde_json::from_slice(&body)
            .map_err(|e| ChainError::Decode(format!("{}: {}", BROADCAST_PATH, e)))?;

        match result.code {
            Some(code) if code != 0 => Err(ChainError::Rejected {
                code,
                log: result.raw_log,
            }),
            _ if result.txhash.is_empty() => {
                Err(ChainError::Decode("broadcast response without txhash".to_string()))
            }
            _ => Ok(TxHash(result.txhash)),
        }
    }
}

#[async_trait]
impl ChainQuery for LcdClient {
    async fn latest_block_height(&self) -> ChainResult<BlockHeight> {
        let response: LatestBlockResponse = self.get_json(LATEST_BLOCK_PATH).await?;
        response
            .block
            .header
            .height
            .parse()
            .map_err(|e| ChainError::Decode(format!("block height: {}", e)))
    }

    async fn oracle_params(&self) -> ChainResult<OracleParams> {
        let response: ParamsResponse = self.get_json(ORACLE_PARAMS_PATH).await?;
        Ok(response.params)
    }
}

#[async_trait]
impl RateQuery for LcdClient {
    async fn exchange_rates(&self) -> ChainResult<Vec<ExchangeRate>> {
        let response: ExchangeRatesResponse = self.get_json(EXCHANGE_RATES_PATH).await?;
        Ok(response.exchange_rates)
    }
}

impl std::fmt::Debug for LcdClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LcdClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}
