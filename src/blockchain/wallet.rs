//! Feeder key and transaction signing.
//!
//! # Security
//! - The signing key is loaded ONLY from an environment variable
//! - Keys are never logged or serialized

use alloy::primitives::B256;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::blockchain::types::{ChainError, ChainResult};

/// Environment variable name for the feeder's secp256k1 private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "FEEDER_PRIVATE_KEY";

/// Feeder wallet with account-sequence tracking.
#[derive(Debug, Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
    /// Next sequence to use; shared between clones.
    sequence: Arc<AtomicU64>,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key (with or without 0x).
    pub fn from_private_key(private_key_hex: &str) -> ChainResult<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| ChainError::Wallet(format!("Invalid private key format: {}", e)))?;

        let wallet = Self {
            signer,
            sequence: Arc::new(AtomicU64::new(0)),
        };
        tracing::info!(public_key = %hex::encode(wallet.public_key()), "Wallet initialized");
        Ok(wallet)
    }

    /// Load the wallet from `FEEDER_PRIVATE_KEY`.
    pub fn from_env() -> ChainResult<Self> {
        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR).map_err(|_| {
            ChainError::Wallet(format!("Environment variable {} not set", PRIVATE_KEY_ENV_VAR))
        })?;
        Self::from_private_key(&private_key)
    }

    /// 33-byte compressed SEC1 public key.
    pub fn public_key(&self) -> Vec<u8> {
        self.signer
            .credential()
            .verifying_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec()
    }

    /// Sequence to sign the next transaction with: the chain's view, unless
    /// a transaction we sent has not been reflected there yet.
    pub fn next_sequence(&self, chain_sequence: u64) -> u64 {
        self.sequence.fetch_max(chain_sequence, Ordering::SeqCst).max(chain_sequence)
    }

    /// Record that a transaction with `used` was accepted.
    pub fn confirm_sequence(&self, used: u64) {
        self.sequence.fetch_max(used + 1, Ordering::SeqCst);
    }

    /// Sign `sign_bytes` Cosmos-style: secp256k1 over SHA-256, 64-byte `r || s`.
    pub async fn sign(&self, sign_bytes: &[u8]) -> ChainResult<[u8; 64]> {
        let digest: [u8; 32] = Sha256::digest(sign_bytes).into();
        let signature = self
            .signer
            .sign_hash(&B256::from(digest))
            .await
            .map_err(|e| ChainError::Wallet(format!("Signing failed: {}", e)))?;

        let mut out = [0u8; 64];
        out.copy_from_slice(&signature.as_bytes()[..64]);
        Ok(out)
    }
}
