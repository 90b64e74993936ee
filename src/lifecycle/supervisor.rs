//! Crash boundary around the voting cycle.
//!
//! One pass is: gate → initial feed snapshot → background refresh → vote
//! engine. Any error that escapes a pass is logged, the pass's state
//! (voting state, snapshot, refresh task) is dropped, and a fresh pass
//! starts after a fixed cooldown. A pending reveal does not survive a
//! restart.
//!
//! Each pass runs in its own task, so a panic inside it ends that pass the
//! same way an error does.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::blockchain::traits::{Broadcaster, ChainQuery, RateQuery};
use crate::blockchain::types::OracleParams;
use crate::config::schema::TimingConfig;
use crate::config::validation::Endpoint;
use crate::feeds::refresher::FeedRefresher;
use crate::lifecycle::gate::ConnectivityGate;
use crate::observability::metrics;
use crate::voting::engine::{CycleError, VoteEngine};
use crate::voting::message::VoterIdentity;
use crate::voting::salt::SaltSource;
use crate::voting::state::VotingState;

/// External capabilities a voting cycle runs against.
#[derive(Clone)]
pub struct Collaborators {
    pub chain: Arc<dyn ChainQuery>,
    pub rates: Arc<dyn RateQuery>,
    pub broadcaster: Arc<dyn Broadcaster>,
    pub salts: Arc<dyn SaltSource>,
}

#[derive(Clone)]
pub struct Supervisor {
    deps: Collaborators,
    target: Endpoint,
    voter: VoterIdentity,
    timing: TimingConfig,
    default_params: OracleParams,
}

impl Supervisor {
    pub fn new(
        deps: Collaborators,
        target: Endpoint,
        voter: VoterIdentity,
        timing: TimingConfig,
        default_params: OracleParams,
    ) -> Self {
        Self {
            deps,
            target,
            voter,
            timing,
            default_params,
        }
    }

    /// One full pass. Only returns on an unhandled error.
    pub async fn run_cycle(&self) -> Result<(), CycleError> {
        let gate = ConnectivityGate::new(
            self.target.clone(),
            self.deps.chain.clone(),
            self.timing.connect_timeout(),
            self.timing.commit_timeout(),
        );
        gate.wait_until_live().await;

        let refresher = FeedRefresher::initialize(
            self.deps.rates.clone(),
            self.deps.chain.clone(),
            self.default_params.clone(),
        )
        .await
        .map_err(CycleError::InitialRates)?;
        let feeds = refresher.feeds();
        let _refresh = refresher.spawn(self.timing.refresh_interval());

        let engine = VoteEngine::new(
            self.deps.chain.clone(),
            self.deps.broadcaster.clone(),
            self.deps.salts.clone(),
            feeds,
            self.voter.clone(),
            self.timing.commit_timeout(),
        );
        let mut state = VotingState::new();
        engine.run(&mut state).await
    }

    /// Run one pass in a separate task, turning a panic into a pass error.
    async fn run_isolated_cycle(&self) -> Result<(), CycleError> {
        let this = self.clone();
        let mut pass = PassTask(tokio::spawn(async move { this.run_cycle().await }));
        match (&mut pass.0).await {
            Ok(result) => result,
            Err(e) => Err(CycleError::Panicked(e.to_string())),
        }
    }

    /// Restart passes until `stop` returns true for a pass's error.
    ///
    /// Returns the number of passes that ended.
    pub async fn run_until<F>(&self, mut stop: F) -> usize
    where
        F: FnMut(&CycleError) -> bool,
    {
        let cooldown = self.timing.restart_cooldown();
        let mut passes = 0;
        loop {
            let result = self.run_isolated_cycle().await;
            passes += 1;
            match result {
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        cooldown_ms = cooldown.as_millis() as u64,
                        "Voting cycle failed, restarting with empty state"
                    );
                    if stop(&e) {
                        return passes;
                    }
                }
                Ok(()) => tracing::warn!("Voting cycle ended, restarting"),
            }
            metrics::record_supervisor_restart();
            sleep(cooldown).await;
        }
    }

    /// Run forever.
    pub async fn run(&self) {
        self.run_until(|_| false).await;
    }
}

/// Running pass; aborted when the supervisor future is dropped.
struct PassTask(JoinHandle<Result<(), CycleError>>);

impl Drop for PassTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}
