//! In-memory voting state.
//!
//! # State Transitions
//! ```text
//! broadcast ok:     last_success_period = period, pending_reveal = this vote
//! broadcast failed: unchanged (the same reveal rides the next attempt)
//! restart:          reset to empty (the pending reveal is lost)
//! ```

use crate::voting::message::VoteMessage;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VotingState {
    last_success_period: Option<u64>,
    pending_reveal: Option<VoteMessage>,
}

impl VotingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_success_period(&self) -> Option<u64> {
        self.last_success_period
    }

    /// Vote whose prevote was the last one broadcast successfully.
    pub fn pending_reveal(&self) -> Option<&VoteMessage> {
        self.pending_reveal.as_ref()
    }

    /// Record a confirmed broadcast: `vote` becomes the reveal owed next.
    pub fn record_success(&mut self, period: u64, vote: VoteMessage) {
        self.last_success_period = Some(period);
        self.pending_reveal = Some(vote);
    }
}
