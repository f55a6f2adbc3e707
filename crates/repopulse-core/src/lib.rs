pub mod activity;
pub mod config;
pub mod detector;
pub mod error;
pub mod repo;
pub mod task;
pub mod tracked;
pub mod window;

// Re-exports
pub use activity::{ActivityCounts, ActivityDetail, ActivityItem, ActivityKind, ActivitySnapshot};
pub use crate::config::Settings;
pub use detector::{detect, UpdateReport};
pub use error::{Error, Result};
pub use repo::RepoSummary;
pub use task::{Cadence, NotificationTask, TaskRecord, TaskRequest};
pub use tracked::TrackedRepository;
pub use window::{validate_days, TimeWindow};
