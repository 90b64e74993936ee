//! Transaction building, signing and broadcasting.
//!
//! Vote transactions use the legacy amino-JSON format:
//! ```text
//! sign doc (keys sorted, compact) → sha256 → secp256k1 → StdTx → POST /txs
//! ```

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};

use crate::blockchain::client::LcdClient;
use crate::blockchain::traits::Broadcaster;
use crate::blockchain::types::{ChainError, ChainResult, TargetChainConfig, TxHash};
use crate::blockchain::wallet::Wallet;
use crate::config::validation::parse_gas_price;
use crate::voting::message::OracleMsg;

const PUBKEY_TYPE: &str = "tendermint/PubKeySecp256k1";

/// Fee attached to every vote transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fee {
    pub amount: u128,
    pub denom: String,
    pub gas: u64,
}

impl Fee {
    /// `ceil(gas_limit * gas_price)` in the gas price's denom.
    pub fn from_gas_price(gas_prices: &str, gas_limit: u64) -> ChainResult<Self> {
        let price = parse_gas_price(gas_prices)
            .ok_or_else(|| ChainError::Wallet(format!("Invalid gas price '{}'", gas_prices)))?;
        Ok(Self {
            amount: price.fee_for(gas_limit),
            denom: price.denom,
            gas: gas_limit,
        })
    }

    fn to_amino_json(&self) -> Value {
        json!({
            "amount": [{ "amount": self.amount.to_string(), "denom": self.denom }],
            "gas": self.gas.to_string(),
        })
    }
}

/// Canonical sign bytes: compact JSON with lexicographically sorted keys.
///
/// `serde_json::Map` is a `BTreeMap` unless `preserve_order` is enabled,
/// so serializing a `Value` already sorts every object.
pub fn sign_bytes(
    chain_id: &str,
    account_number: u64,
    sequence: u64,
    fee: &Fee,
    memo: &str,
    msgs: &[Value],
) -> ChainResult<Vec<u8>> {
    let doc = json!({
        "account_number": account_number.to_string(),
        "chain_id": chain_id,
        "fee": fee.to_amino_json(),
        "memo": memo,
        "msgs": msgs,
        "sequence": sequence.to_string(),
    });
    serde_json::to_vec(&doc).map_err(|e| ChainError::Decode(format!("sign doc: {}", e)))
}

/// Builds, signs and broadcasts vote transactions for one feeder account.
pub struct TxSubmitter {
    client: LcdClient,
    wallet: Wallet,
    feeder_address: String,
    chain_id: String,
    fee: Fee,
    broadcast_mode: String,
}

impl TxSubmitter {
    pub fn new(
        client: LcdClient,
        wallet: Wallet,
        feeder_address: String,
        config: &TargetChainConfig,
    ) -> ChainResult<Self> {
        Ok(Self {
            client,
            wallet,
            feeder_address,
            chain_id: config.chain_id.clone(),
            fee: Fee::from_gas_price(&config.gas_prices, config.gas_limit)?,
            broadcast_mode: config.broadcast_mode.clone(),
        })
    }

    /// Build the signed broadcast body for `msgs` at the given sequence.
    pub async fn build_signed(
        &self,
        msgs: &[OracleMsg],
        account_number: u64,
        sequence: u64,
    ) -> ChainResult<Value> {
        let amino_msgs: Vec<Value> = msgs.iter().map(OracleMsg::to_amino_json).collect();
        let bytes = sign_bytes(
            &self.chain_id,
            account_number,
            sequence,
            &self.fee,
            "",
            &amino_msgs,
        )?;
        let signature = self.wallet.sign(&bytes).await?;

        Ok(json!({
            "tx": {
                "msg": amino_msgs,
                "fee": self.fee.to_amino_json(),
                "signatures": [{
                    "pub_key": {
                        "type": PUBKEY_TYPE,
                        "value": BASE64.encode(self.wallet.public_key()),
                    },
                    "signature": BASE64.encode(signature),
                }],
                "memo": "",
            },
            "mode": self.broadcast_mode,
        }))
    }
}

#[async_trait]
impl Broadcaster for TxSubmitter {
    async fn broadcast(&self, msgs: &[OracleMsg]) -> ChainResult<TxHash> {
        // Sync the sequence from chain before every build
        let account = self.client.account(&self.feeder_address).await?;
        let sequence = self.wallet.next_sequence(account.sequence);

        let body = self
            .build_signed(msgs, account.account_number, sequence)
            .await?;
        let tx_hash = self.client.broadcast_tx(&body).await?;
        self.wallet.confirm_sequence(sequence);

        tracing::debug!(
            tx_hash = %tx_hash,
            sequence,
            msgs = msgs.len(),
            "Transaction broadcast"
        );
        Ok(tx_hash)
    }
}
