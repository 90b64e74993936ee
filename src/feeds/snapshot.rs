//! Atomically swapped rate and parameter snapshots.
//!
//! Each value has exactly one writer (the refresher) and is replaced whole,
//! so a reader sees either the old or the new snapshot, never a mix.

use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::blockchain::types::{ExchangeRate, OracleParams};

#[derive(Debug)]
pub struct FeedSnapshot {
    rates: ArcSwap<Vec<ExchangeRate>>,
    params: ArcSwap<OracleParams>,
}

impl FeedSnapshot {
    pub fn new(rates: Vec<ExchangeRate>, params: OracleParams) -> Self {
        Self {
            rates: ArcSwap::from_pointee(rates),
            params: ArcSwap::from_pointee(params),
        }
    }

    /// Latest exchange rates.
    pub fn rates(&self) -> Arc<Vec<ExchangeRate>> {
        self.rates.load_full()
    }

    /// Latest oracle parameters.
    pub fn params(&self) -> Arc<OracleParams> {
        self.params.load_full()
    }

    pub fn store_rates(&self, rates: Vec<ExchangeRate>) {
        self.rates.store(Arc::new(rates));
    }

    pub fn store_params(&self, params: OracleParams) {
        self.params.store(Arc::new(params));
    }
}
