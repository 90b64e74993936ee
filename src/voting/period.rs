//! Vote period arithmetic.
//!
//! ```text
//! vote_period = 5
//! height:   0 1 2 3 4 | 5 6 7 8 9 | 10 ...
//! period:   0 0 0 0 0 | 1 1 1 1 1 | 2
//! index:    0 1 2 3 4 | 0 1 2 3 4 | 0
//! submit:   y y y y n | y y y y n | y
//! ```
//!
//! The last block of each period is never used: a transaction sent then
//! would most likely land in the next period.

use crate::blockchain::types::BlockHeight;

/// Where a block height falls relative to the vote periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodPosition {
    pub vote_period: u64,
    pub index_in_period: u64,
}

/// Why a submission is not allowed at a given height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A vote already landed in this period.
    AlreadyVoted,
    /// Too close to the period boundary.
    LastBlockOfPeriod,
}

/// Locate `height` within periods of `period_len` blocks.
///
/// Returns `None` when `period_len` is zero.
pub fn locate(height: BlockHeight, period_len: u64) -> Option<PeriodPosition> {
    if period_len == 0 {
        return None;
    }
    Some(PeriodPosition {
        vote_period: height / period_len,
        index_in_period: height % period_len,
    })
}

/// Decide whether a vote may be submitted at `position`.
pub fn check_submit(
    position: PeriodPosition,
    period_len: u64,
    last_success_period: Option<u64>,
) -> Result<(), SkipReason> {
    if last_success_period == Some(position.vote_period) {
        return Err(SkipReason::AlreadyVoted);
    }
    if position.index_in_period + 1 >= period_len {
        return Err(SkipReason::LastBlockOfPeriod);
    }
    Ok(())
}
