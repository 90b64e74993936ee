//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Supervisor (supervisor.rs):
//!     loop {
//!         gate.rs: TCP probe → first block
//!         feeds: initial snapshot → background refresh
//!         voting engine: iterate until an unhandled error
//!         cooldown
//!     }
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → binary exits
//! ```
//!
//! # Design Decisions
//! - Every restart starts from empty voting state; nothing is persisted
//! - Fixed cooldown between passes, no exponential backoff
//! - The gate retries forever and never fails a pass

pub mod gate;
pub mod signals;
pub mod supervisor;

pub use gate::ConnectivityGate;
pub use supervisor::{Collaborators, Supervisor};
