pub mod digest;
pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod mailer;
pub mod scheduler;
pub mod services;
pub mod tracker;

// Re-exports
pub use digest::Digest;
pub use discovery::{TrendingService, DEFAULT_SEARCH_LIMIT};
pub use dispatcher::{DigestPipeline, DispatchOutcome, NotificationDispatcher};
pub use error::{Error, Result};
pub use mailer::{Mailer, SmtpMailer};
pub use scheduler::{Job, Scheduler, Trigger};
pub use services::Services;
pub use tracker::{ActivityTracker, RefreshResult, TrackedView};
