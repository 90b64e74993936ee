//! Commit-reveal voting core.
//!
//! # Data Flow
//! ```text
//! latest height + params snapshot
//!     → period.rs (vote period, index, may we submit?)
//!     → payload.rs (whitelisted rates → canonical string)
//!     → salt.rs (fresh salt) → message.rs (vote + derived prevote)
//!     → engine.rs (broadcast [reveal?, prevote], update state.rs)
//! ```

pub mod engine;
pub mod message;
pub mod payload;
pub mod period;
pub mod salt;
pub mod state;

pub use engine::{CycleError, StepOutcome, VoteEngine};
pub use message::{OracleMsg, PrevoteMessage, VoteMessage, VoterIdentity};
pub use payload::PricePayload;
pub use salt::{OsSalt, SaltSource, SequentialSalt, VoteSalt};
pub use state::VotingState;
