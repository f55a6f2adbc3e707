use crate::{ActivitySource, Error, Result};
use chrono::{DateTime, FixedOffset};
use repopulse_core::{ActivityKind, ActivitySnapshot, TimeWindow, TrackedRepository};
use std::sync::Arc;

/// Builds an [`ActivitySnapshot`] for one repository from an activity source.
///
/// Pure fetch: nothing is persisted here.
#[derive(Clone)]
pub struct ActivityCollector {
    source: Arc<dyn ActivitySource>,
    window: TimeWindow,
}

impl ActivityCollector {
    pub fn new(source: Arc<dyn ActivitySource>, window: TimeWindow) -> Self {
        Self { source, window }
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    /// Fetch every activity kind newer than `cutoff`.
    ///
    /// Any failure, including an invalid name, is reported as
    /// `CollectionFailed` for this repository only.
    pub async fn collect(&self, repository: &str, cutoff: DateTime<FixedOffset>) -> Result<ActivitySnapshot> {
        let failed = |cause: Error| Error::CollectionFailed {
            repository: repository.to_string(),
            cause: Box::new(cause),
        };

        let repo = TrackedRepository::parse(repository).map_err(|e| failed(e.into()))?;
        tracing::info!(repository = %repo, cutoff = %cutoff, "Collecting activity");

        let mut items = Vec::new();
        for kind in ActivityKind::ALL {
            let fetched = self
                .source
                .fetch(&repo, kind, cutoff)
                .await
                .map_err(failed)?;
            tracing::debug!(repository = %repo, %kind, count = fetched.len(), "Fetched activity");
            items.extend(fetched.into_iter().filter(|item| item.timestamp > cutoff));
        }

        Ok(ActivitySnapshot::new(repo.full_name, self.window.now(), items))
    }
}
