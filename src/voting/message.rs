//! Aggregate exchange-rate prevote and vote messages.
//!
//! A vote is built first; its prevote is derived from it by hashing
//! `salt:exchange_rates:validator` and keeping the first 20 bytes of the
//! SHA-256 digest. The prevote goes on chain now, the vote one period later.

use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::voting::payload::PricePayload;
use crate::voting::salt::VoteSalt;

pub const PREVOTE_TYPE: &str = "oracle/MsgAggregateExchangeRatePrevote";
pub const VOTE_TYPE: &str = "oracle/MsgAggregateExchangeRateVote";

/// Length of the truncated commitment hash in bytes.
const PREVOTE_HASH_LEN: usize = 20;

/// Who is voting: the feeder account signs, the validator's weight counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoterIdentity {
    pub feeder: String,
    pub validator: String,
}

/// Reveal half of the commit-reveal pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteMessage {
    pub payload: PricePayload,
    pub salt: VoteSalt,
    pub voter: VoterIdentity,
}

/// Commitment half of the commit-reveal pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrevoteMessage {
    /// Hex-encoded truncated SHA-256 commitment.
    pub hash: String,
    pub voter: VoterIdentity,
}

/// A message that can ride in a vote transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleMsg {
    Prevote(PrevoteMessage),
    Vote(VoteMessage),
}

impl VoteMessage {
    pub fn new(payload: PricePayload, salt: VoteSalt, voter: VoterIdentity) -> Self {
        Self {
            payload,
            salt,
            voter,
        }
    }

    /// The commitment this vote reveals.
    pub fn prevote(&self) -> PrevoteMessage {
        PrevoteMessage {
            hash: commitment_hash(&self.salt, &self.payload, &self.voter.validator),
            voter: self.voter.clone(),
        }
    }
}

/// `hex(sha256("{salt}:{exchange_rates}:{validator}")[..20])`
pub fn commitment_hash(salt: &VoteSalt, payload: &PricePayload, validator: &str) -> String {
    let preimage = format!("{}:{}:{}", salt, payload, validator);
    let digest = Sha256::digest(preimage.as_bytes());
    hex::encode(&digest[..PREVOTE_HASH_LEN])
}

impl OracleMsg {
    /// Amino JSON form used in both the sign doc and the broadcast body.
    pub fn to_amino_json(&self) -> Value {
        match self {
            OracleMsg::Prevote(prevote) => json!({
                "type": PREVOTE_TYPE,
                "value": {
                    "hash": prevote.hash,
                    "feeder": prevote.voter.feeder,
                    "validator": prevote.voter.validator,
                }
            }),
            OracleMsg::Vote(vote) => json!({
                "type": VOTE_TYPE,
                "value": {
                    "salt": vote.salt.as_str(),
                    "exchange_rates": vote.payload.as_str(),
                    "feeder": vote.voter.feeder,
                    "validator": vote.voter.validator,
                }
            }),
        }
    }

    pub fn is_vote(&self) -> bool {
        matches!(self, OracleMsg::Vote(_))
    }
}
