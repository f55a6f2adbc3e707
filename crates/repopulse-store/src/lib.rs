pub mod error;
mod fsutil;
pub mod snapshot;
pub mod tasks;
pub mod tracked;
pub mod trending;

// Re-exports
pub use error::{Error, Result};
pub use snapshot::{SnapshotId, SnapshotStore};
pub use tasks::TaskStore;
pub use tracked::TrackedRepoList;
pub use trending::{TrendingCapture, TrendingStore};
