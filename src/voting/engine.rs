//! Period-synchronized vote engine.
//!
//! # Iteration
//! ```text
//! latest height ──err──▶ wait 1 commit, retry
//!      │
//!      ▼
//! (period, index) ──skip──▶ wait 1 commit, retry
//!      │
//!      ▼
//! payload + fresh salt → prevote
//!      │
//!      ▼
//! broadcast [pending reveal?, new prevote]
//!      ├─ ok:   last_success_period = period, pending reveal = this vote
//!      └─ err:  state untouched, same reveal is owed next time
//!      │
//!      ▼
//! wait (vote_period - 1) commits
//! ```
//!
//! Errors that escape `step` are not retried here; they end the cycle and
//! the supervisor restarts it with a fresh `VotingState`.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

use crate::blockchain::traits::{Broadcaster, ChainQuery};
use crate::blockchain::types::{BlockHeight, ChainError, TxHash};
use crate::feeds::snapshot::FeedSnapshot;
use crate::observability::metrics;
use crate::voting::message::{OracleMsg, VoteMessage, VoterIdentity};
use crate::voting::payload::PricePayload;
use crate::voting::period::{self, SkipReason};
use crate::voting::salt::{SaltSource, VoteSalt};
use crate::voting::state::VotingState;

/// Failures that end a voting cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("failed to load initial exchange rates: {0}")]
    InitialRates(#[source] ChainError),

    #[error("oracle vote period is zero")]
    InvalidVotePeriod,

    #[error("salt generation failed: {0}")]
    Salt(#[from] rand::Error),

    #[error("salt source repeated the previous salt {0} draws in a row")]
    SaltRepeated(usize),

    #[error("voting cycle panicked: {0}")]
    Panicked(String),
}

/// Draws allowed before a source stuck on the previous salt is an error.
const MAX_SALT_DRAWS: usize = 8;

/// What one iteration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Latest block could not be fetched.
    BlockQueryFailed,
    /// Submission not allowed at this height.
    Skipped {
        height: BlockHeight,
        vote_period: u64,
        reason: SkipReason,
    },
    /// No whitelisted rate was available to vote with.
    EmptyPayload { vote_period: u64 },
    /// Transaction accepted.
    Submitted {
        vote_period: u64,
        tx_hash: TxHash,
        revealed: bool,
    },
    /// Transaction failed; voting state unchanged.
    BroadcastFailed { vote_period: u64 },
}

pub struct VoteEngine {
    chain: Arc<dyn ChainQuery>,
    broadcaster: Arc<dyn Broadcaster>,
    salts: Arc<dyn SaltSource>,
    feeds: Arc<FeedSnapshot>,
    voter: VoterIdentity,
    commit_timeout: Duration,
    /// Salt of the most recently built prevote.
    last_salt: Mutex<Option<VoteSalt>>,
}

impl VoteEngine {
    pub fn new(
        chain: Arc<dyn ChainQuery>,
        broadcaster: Arc<dyn Broadcaster>,
        salts: Arc<dyn SaltSource>,
        feeds: Arc<FeedSnapshot>,
        voter: VoterIdentity,
        commit_timeout: Duration,
    ) -> Self {
        Self {
            chain,
            broadcaster,
            salts,
            feeds,
            voter,
            commit_timeout,
            last_salt: Mutex::new(None),
        }
    }

    /// Draw a salt that differs from the one used by the previous prevote.
    fn fresh_salt(&self) -> Result<VoteSalt, CycleError> {
        let mut last = self.last_salt.lock().unwrap_or_else(|e| e.into_inner());
        for _ in 0..MAX_SALT_DRAWS {
            let salt = self.fresh_salt()?;
            if last.as_ref() != Some(&salt) {
                *last = Some(salt.clone());
                return Ok(salt);
            }
            tracing::debug!(salt = %salt, "Salt repeats the previous prevote, redrawing");
        }
        Err(CycleError::SaltRepeated(MAX_SALT_DRAWS))
    }

    /// Run one iteration and return its outcome together with how long to
    /// wait before the next one.
    pub async fn step(
        &self,
        state: &mut VotingState,
    ) -> Result<(StepOutcome, Duration), CycleError> {
        let height = match self.chain.latest_block_height().await {
            Ok(height) => height,
            Err(e) => {
                tracing::error!(error = %e, "Failed to get latest block");
                metrics::record_block_query_failure();
                return Ok((StepOutcome::BlockQueryFailed, self.commit_timeout));
            }
        };

        let params = self.feeds.params();
        let period_len = params.vote_period;
        let position = period::locate(height, period_len).ok_or(CycleError::InvalidVotePeriod)?;
        let vote_period = position.vote_period;

        let allowed = period::check_submit(position, period_len, state.last_success_period());
        if let Err(reason) = allowed {
            tracing::debug!(
                height,
                vote_period,
                index = position.index_in_period,
                ?reason,
                "Not submitting in this block"
            );
            let outcome = StepOutcome::Skipped {
                height,
                vote_period,
                reason,
            };
            return Ok((outcome, self.commit_timeout));
        }

        let rates = self.feeds.rates();
        let payload = PricePayload::build(&rates, &params.whitelist_set());
        if payload.is_empty() {
            tracing::warn!(
                vote_period,
                rates = rates.len(),
                "No whitelisted exchange rate available, not voting"
            );
            return Ok((StepOutcome::EmptyPayload { vote_period }, self.commit_timeout));
        }

        let salt = self.salts.next_salt()?;
        let vote = VoteMessage::new(payload, salt, self.voter.clone());

        let mut msgs = Vec::with_capacity(2);
        if let Some(reveal) = state.pending_reveal() {
            msgs.push(OracleMsg::Vote(reveal.clone()));
        }
        msgs.push(OracleMsg::Prevote(vote.prevote()));
        let revealed = msgs.len() == 2;

        let commits = u32::try_from(period_len.saturating_sub(1)).unwrap_or(u32::MAX);
        let after_attempt = self.commit_timeout.saturating_mul(commits);

        match self.broadcaster.broadcast(&msgs).await {
            Ok(tx_hash) => {
                tracing::info!(
                    vote_period,
                    height,
                    tx_hash = %tx_hash,
                    revealed,
                    rates = vote.payload.len(),
                    "Vote submitted"
                );
                metrics::record_vote_submitted(vote_period);
                state.record_success(vote_period, vote);
                let outcome = StepOutcome::Submitted {
                    vote_period,
                    tx_hash,
                    revealed,
                };
                Ok((outcome, after_attempt))
            }
            Err(e) => {
                tracing::error!(vote_period, height, error = %e, "Failed to broadcast vote");
                metrics::record_broadcast_failure();
                Ok((StepOutcome::BroadcastFailed { vote_period }, after_attempt))
            }
        }
    }

    /// Iterate until `stop` returns true for an outcome, sleeping between
    /// iterations. The outcome that stopped the loop is returned without
    /// sleeping after it.
    pub async fn run_until<F>(
        &self,
        state: &mut VotingState,
        mut stop: F,
    ) -> Result<StepOutcome, CycleError>
    where
        F: FnMut(&StepOutcome) -> bool,
    {
        loop {
            let (outcome, wait) = self.step(state).await?;
            if stop(&outcome) {
                return Ok(outcome);
            }
            tokio::time::sleep(wait).await;
        }
    }

    /// Iterate forever; only returns when an iteration fails.
    pub async fn run(&self, state: &mut VotingState) -> Result<(), CycleError> {
        self.run_until(state, |_| false).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::{ChainResult, ExchangeRate, OracleParams};
    use crate::voting::salt::SequentialSalt;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Chain that replays a script of heights; errors once it runs out.
    struct ScriptedChain {
        heights: Mutex<VecDeque<ChainResult<BlockHeight>>>,
    }

    impl ScriptedChain {
        fn new(heights: Vec<ChainResult<BlockHeight>>) -> Arc<Self> {
            Arc::new(Self {
                heights: Mutex::new(heights.into()),
            })
        }
    }

    #[async_trait]
    impl ChainQuery for ScriptedChain {
        async fn latest_block_height(&self) -> ChainResult<BlockHeight> {
            self.heights
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ChainError::Decode("script exhausted".to_string())))
        }

        async fn oracle_params(&self) -> ChainResult<OracleParams> {
            Ok(OracleParams::default())
        }
    }

    /// Broadcaster that records every message list and fails on demand.
    #[derive(Default)]
    struct RecordingBroadcaster {
        sent: Mutex<Vec<Vec<OracleMsg>>>,
        results: Mutex<VecDeque<bool>>,
    }

    impl RecordingBroadcaster {
        fn with_results(results: &[bool]) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                results: Mutex::new(results.iter().copied().collect()),
            })
        }

        fn sent(&self) -> Vec<Vec<OracleMsg>> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Broadcaster for RecordingBroadcaster {
        async fn broadcast(&self, msgs: &[OracleMsg]) -> ChainResult<TxHash> {
            let mut sent = self.sent.lock().unwrap();
            sent.push(msgs.to_vec());
            let ok = self.results.lock().unwrap().pop_front().unwrap_or(true);
            if ok {
                Ok(TxHash(format!("TX{}", sent.len())))
            } else {
                Err(ChainError::Rejected {
                    code: 32,
                    log: "account sequence mismatch".to_string(),
                })
            }
        }
    }

    fn voter() -> VoterIdentity {
        VoterIdentity {
            feeder: "terra1feeder".to_string(),
            validator: "terravaloper1validator".to_string(),
        }
    }

    fn feeds() -> Arc<FeedSnapshot> {
        Arc::new(FeedSnapshot::new(
            vec![
                ExchangeRate::new("uusd", "1"),
                ExchangeRate::new("ukrw", "2"),
                ExchangeRate::new("xyz", "9"),
            ],
            OracleParams::default(),
        ))
    }

    fn engine(chain: Arc<ScriptedChain>, broadcaster: Arc<RecordingBroadcaster>) -> VoteEngine {
        VoteEngine::new(
            chain,
            broadcaster,
            Arc::new(SequentialSalt::default()),
            feeds(),
            voter(),
            Duration::from_secs(5),
        )
    }

    fn prevote_hash(msgs: &[OracleMsg]) -> String {
        match msgs.last() {
            Some(OracleMsg::Prevote(p)) => p.hash.clone(),
            other => panic!("last message is not a prevote: {:?}", other),
        }
    }

    fn reveal(msgs: &[OracleMsg]) -> Option<VoteMessage> {
        msgs.iter().find_map(|m| match m {
            OracleMsg::Vote(v) => Some(v.clone()),
            _ => None,
        })
    }

    #[tokio::test]
    async fn test_first_vote_carries_only_prevote() {
        let chain = ScriptedChain::new(vec![Ok(0), Ok(1)]);
        let broadcaster = RecordingBroadcaster::with_results(&[]);
        let engine = engine(chain, broadcaster.clone());
        let mut state = VotingState::new();

        let (outcome, wait) = engine.step(&mut state).await.unwrap();
        assert_eq!(
            outcome,
            StepOutcome::Submitted {
                vote_period: 0,
                tx_hash: TxHash("TX1".to_string()),
                revealed: false
            }
        );
        assert_eq!(wait, Duration::from_secs(20));
        assert_eq!(broadcaster.sent()[0].len(), 1);
        assert_eq!(state.last_success_period(), Some(0));

        // same period again: not allowed
        let (outcome, wait) = engine.step(&mut state).await.unwrap();
        assert!(matches!(
            outcome,
            StepOutcome::Skipped {
                reason: SkipReason::AlreadyVoted,
                ..
            }
        ));
        assert_eq!(wait, Duration::from_secs(5));
        assert_eq!(broadcaster.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_success_replaces_pending_reveal() {
        let chain = ScriptedChain::new(vec![Ok(5), Ok(10)]);
        let broadcaster = RecordingBroadcaster::with_results(&[true, true]);
        let engine = engine(chain, broadcaster.clone());
        let mut state = VotingState::new();

        engine.step(&mut state).await.unwrap();
        let first = state.pending_reveal().cloned().unwrap();
        assert_eq!(first.payload.as_str(), "2ukrw,1uusd");

        let (outcome, _) = engine.step(&mut state).await.unwrap();
        assert!(matches!(outcome, StepOutcome::Submitted { vote_period: 2, revealed: true, .. }));

        let sent = broadcaster.sent();
        assert_eq!(reveal(&sent[1]), Some(first.clone()));
        assert_eq!(first.prevote().hash, prevote_hash(&sent[0]));

        let second = state.pending_reveal().unwrap();
        assert_ne!(second.salt, first.salt);
        assert_eq!(second.prevote().hash, prevote_hash(&sent[1]));
        assert_eq!(state.last_success_period(), Some(2));
    }

    #[tokio::test]
    async fn test_failure_carries_same_reveal_forward() {
        let chain = ScriptedChain::new(vec![Ok(5), Ok(10), Ok(11)]);
        let broadcaster = RecordingBroadcaster::with_results(&[true, false, true]);
        let engine = engine(chain, broadcaster.clone());
        let mut state = VotingState::new();

        engine.step(&mut state).await.unwrap();
        let owed = state.pending_reveal().cloned().unwrap();
        let before_failure = state.clone();

        let (outcome, wait) = engine.step(&mut state).await.unwrap();
        assert_eq!(outcome, StepOutcome::BroadcastFailed { vote_period: 2 });
        assert_eq!(wait, Duration::from_secs(20));
        assert_eq!(state, before_failure);

        let (outcome, _) = engine.step(&mut state).await.unwrap();
        assert!(matches!(outcome, StepOutcome::Submitted { vote_period: 2, revealed: true, .. }));

        let sent = broadcaster.sent();
        assert_eq!(reveal(&sent[1]), Some(owed.clone()));
        assert_eq!(reveal(&sent[2]), Some(owed));
        // retries build a fresh prevote every time
        assert_ne!(prevote_hash(&sent[1]), prevote_hash(&sent[2]));
    }

    #[tokio::test]
    async fn test_block_query_failure_leaves_state() {
        let chain = ScriptedChain::new(vec![Err(ChainError::Decode("boom".to_string()))]);
        let broadcaster = RecordingBroadcaster::with_results(&[]);
        let engine = engine(chain, broadcaster.clone());
        let mut state = VotingState::new();

        let (outcome, wait) = engine.step(&mut state).await.unwrap();
        assert_eq!(outcome, StepOutcome::BlockQueryFailed);
        assert_eq!(wait, Duration::from_secs(5));
        assert_eq!(state, VotingState::new());
        assert!(broadcaster.sent().is_empty());
    }

    #[tokio::test]
    async fn test_last_block_of_period_skipped() {
        let chain = ScriptedChain::new(vec![Ok(14)]);
        let broadcaster = RecordingBroadcaster::with_results(&[]);
        let engine = engine(chain, broadcaster.clone());
        let mut state = VotingState::new();

        let (outcome, _) = engine.step(&mut state).await.unwrap();
        assert_eq!(
            outcome,
            StepOutcome::Skipped {
                height: 14,
                vote_period: 2,
                reason: SkipReason::LastBlockOfPeriod
            }
        );
        assert!(broadcaster.sent().is_empty());
    }

    #[tokio::test]
    async fn test_empty_payload_not_broadcast() {
        let chain = ScriptedChain::new(vec![Ok(3)]);
        let broadcaster = RecordingBroadcaster::with_results(&[]);
        let feeds = Arc::new(FeedSnapshot::new(
            vec![ExchangeRate::new("xyz", "9")],
            OracleParams::default(),
        ));
        let engine = VoteEngine::new(
            chain,
            broadcaster.clone(),
            Arc::new(SequentialSalt::default()),
            feeds,
            voter(),
            Duration::from_secs(5),
        );
        let mut state = VotingState::new();

        let (outcome, _) = engine.step(&mut state).await.unwrap();
        assert_eq!(outcome, StepOutcome::EmptyPayload { vote_period: 0 });
        assert!(broadcaster.sent().is_empty());
    }

    #[tokio::test]
    async fn test_zero_vote_period_ends_cycle() {
        let chain = ScriptedChain::new(vec![Ok(3)]);
        let broadcaster = RecordingBroadcaster::with_results(&[]);
        let feeds = feeds();
        feeds.store_params(OracleParams {
            vote_period: 0,
            ..OracleParams::default()
        });
        let engine = VoteEngine::new(
            chain,
            broadcaster,
            Arc::new(SequentialSalt::default()),
            feeds,
            voter(),
            Duration::from_secs(5),
        );

        let result = engine.step(&mut VotingState::new()).await;
        assert!(matches!(result, Err(CycleError::InvalidVotePeriod)));
    }

    /// Salt source replaying fixed byte pairs; the last pair repeats.
    struct ScriptedSalt {
        draws: Mutex<VecDeque<[u8; 2]>>,
        calls: Mutex<usize>,
    }

    impl ScriptedSalt {
        fn new(draws: &[[u8; 2]]) -> Arc<Self> {
            Arc::new(Self {
                draws: Mutex::new(draws.iter().copied().collect()),
                calls: Mutex::new(0),
            })
        }
    }

    impl SaltSource for ScriptedSalt {
        fn fill(&self, dest: &mut [u8]) -> Result<(), rand::Error> {
            *self.calls.lock().unwrap() += 1;
            let mut draws = self.draws.lock().unwrap();
            let bytes = if draws.len() > 1 {
                draws.pop_front().unwrap()
            } else {
                *draws.front().unwrap()
            };
            dest.copy_from_slice(&bytes);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_repeated_salt_is_redrawn() {
        let chain = ScriptedChain::new(vec![Ok(5), Ok(10)]);
        let broadcaster = RecordingBroadcaster::with_results(&[true, true]);
        let salts = ScriptedSalt::new(&[[0x01, 0x01], [0x01, 0x01], [0x02, 0x02]]);
        let engine = VoteEngine::new(
            chain,
            broadcaster.clone(),
            salts.clone(),
            feeds(),
            voter(),
            Duration::from_secs(5),
        );
        let mut state = VotingState::new();

        engine.step(&mut state).await.unwrap();
        let first = state.pending_reveal().cloned().unwrap();
        engine.step(&mut state).await.unwrap();
        let second = state.pending_reveal().cloned().unwrap();

        assert_eq!(first.salt.as_str(), "0101");
        assert_eq!(second.salt.as_str(), "0202");
        assert_eq!(*salts.calls.lock().unwrap(), 3);

        let sent = broadcaster.sent();
        assert_ne!(prevote_hash(&sent[0]), prevote_hash(&sent[1]));
    }

    #[tokio::test]
    async fn test_salt_source_stuck_on_previous_salt_ends_cycle() {
        let chain = ScriptedChain::new(vec![Ok(5), Ok(10)]);
        let broadcaster = RecordingBroadcaster::with_results(&[true]);
        let engine = VoteEngine::new(
            chain,
            broadcaster.clone(),
            ScriptedSalt::new(&[[0xaa, 0xaa]]),
            feeds(),
            voter(),
            Duration::from_secs(5),
        );
        let mut state = VotingState::new();

        engine.step(&mut state).await.unwrap();
        let result = engine.step(&mut state).await;
        assert!(matches!(result, Err(CycleError::SaltRepeated(MAX_SALT_DRAWS))));
        assert_eq!(broadcaster.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_huge_vote_period_wait_saturates() {
        let chain = ScriptedChain::new(vec![Ok(0)]);
        let broadcaster = RecordingBroadcaster::with_results(&[]);
        let feeds = feeds();
        feeds.store_params(OracleParams {
            vote_period: (1u64 << 32) + 1,
            ..OracleParams::default()
        });
        let engine = VoteEngine::new(
            chain,
            broadcaster,
            Arc::new(SequentialSalt::default()),
            feeds,
            voter(),
            Duration::from_secs(5),
        );

        let (outcome, wait) = engine.step(&mut VotingState::new()).await.unwrap();
        assert!(matches!(outcome, StepOutcome::Submitted { .. }));
        assert_eq!(wait, Duration::from_secs(5).saturating_mul(u32::MAX));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_sleeps_between_iterations() {
        let chain = ScriptedChain::new(vec![Ok(0), Ok(1), Ok(5)]);
        let broadcaster = RecordingBroadcaster::with_results(&[]);
        let engine = engine(chain, broadcaster.clone());
        let mut state = VotingState::new();

        let start = tokio::time::Instant::now();
        let mut submitted = 0;
        let outcome = engine
            .run_until(&mut state, |o| {
                if matches!(o, StepOutcome::Submitted { .. }) {
                    submitted += 1;
                }
                submitted == 2
            })
            .await
            .unwrap();

        assert!(matches!(outcome, StepOutcome::Submitted { vote_period: 1, .. }));
        // 4 commits after the first vote, 1 commit after the skip
        assert_eq!(start.elapsed(), Duration::from_secs(25));
    }
}
