//! Reference rates and oracle parameters shared with the vote engine.

pub mod refresher;
pub mod snapshot;

pub use refresher::{FeedRefresher, RefreshTask};
pub use snapshot::FeedSnapshot;
