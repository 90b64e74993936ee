//! Oracle price feeder.
//!
//! Submits aggregate exchange-rate votes to a chain's oracle module once per
//! vote period, using the prevote/vote commit-reveal scheme: each
//! transaction reveals the previous period's vote and commits to a new one.
//!
//! # Architecture Overview
//!
//! ```text
//!   reference LCD ──rates──┐
//!                          ▼
//!                   ┌─────────────┐   atomic swap   ┌──────────────┐
//!   target LCD ────▶│  refresher  │───────────────▶│ FeedSnapshot │
//!    (params)       └─────────────┘                 └──────┬───────┘
//!                                                          │ read
//!   target LCD ──height──▶ ┌────────────────────────────┐  │
//!                          │        VoteEngine          │◀─┘
//!                          │ period → payload → salt →  │
//!                          │ [reveal?, prevote] → state │
//!                          └─────────────┬──────────────┘
//!                                        │ broadcast
//!                                        ▼
//!                                  TxSubmitter ──▶ target LCD
//!
//!   Supervisor: gate → snapshot → engine, restarted on failure
//! ```

// Core subsystems
pub mod blockchain;
pub mod feeds;
pub mod voting;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::FeederConfig;
pub use lifecycle::Supervisor;
pub use voting::{VoteEngine, VotingState};
