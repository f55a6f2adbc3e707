use crate::Result;
use chrono::{DateTime, FixedOffset};
use repopulse_ai::Translator;
use repopulse_core::{
    detect, ActivityCounts, ActivityItem, ActivitySnapshot, TimeWindow, TrackedRepository,
    UpdateReport,
};
use repopulse_github::ActivityCollector;
use repopulse_store::{SnapshotStore, TrackedRepoList};
use serde::Serialize;
use tracing::{error, info, warn};

/// Outcome of refreshing one repository
#[derive(Debug, Clone, Serialize)]
pub struct RefreshResult {
    pub repository: String,
    pub success: bool,
    pub items: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A tracked repository as seen through its latest snapshot
#[derive(Debug, Clone, Serialize)]
pub struct TrackedView {
    pub full_name: String,
    pub has_updates: bool,
    pub activities: Vec<ActivityItem>,
    pub last_updated: Option<DateTime<FixedOffset>>,
    pub counts: ActivityCounts,
}

impl TrackedView {
    fn new(full_name: String, report: Option<UpdateReport>, last_updated: Option<DateTime<FixedOffset>>) -> Self {
        let activities = report.map(|r| r.activities).unwrap_or_default();
        Self {
            full_name,
            has_updates: !activities.is_empty(),
            counts: ActivityCounts::from_items(&activities),
            activities,
            last_updated,
        }
    }
}

/// Collects, translates and persists activity for tracked repositories
pub struct ActivityTracker {
    collector: ActivityCollector,
    snapshots: SnapshotStore,
    tracked: TrackedRepoList,
    translator: Option<Translator>,
}

impl ActivityTracker {
    pub fn new(collector: ActivityCollector, snapshots: SnapshotStore, tracked: TrackedRepoList) -> Self {
        Self {
            collector,
            snapshots,
            tracked,
            translator: None,
        }
    }

    pub fn with_translator(mut self, translator: Option<Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn window(&self) -> TimeWindow {
        self.collector.window()
    }

    /// Collect one repository, translate its items and persist the snapshot
    pub async fn capture(&self, repository: &str, cutoff: DateTime<FixedOffset>) -> Result<ActivitySnapshot> {
        let mut snapshot = self.collector.collect(repository, cutoff).await?;

        if let Some(translator) = &self.translator {
            if let Err(e) = translator.translate_items(&mut snapshot.items).await {
                warn!(repository, "Activity translation failed, keeping originals: {}", e);
            }
        }

        let id = self.snapshots.save(&snapshot).await?;
        info!(
            repository,
            snapshot = %id,
            items = snapshot.items.len(),
            "Snapshot captured"
        );
        Ok(snapshot)
    }

    /// Fresh update reports for `repositories`.
    ///
    /// A repository that fails to collect or persist is logged and left out;
    /// the rest of the batch still runs.
    pub async fn updates<'a, I>(&self, repositories: I, days: u32) -> Vec<UpdateReport>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let cutoff = self.window().cutoff(days);
        let mut reports = Vec::new();

        for repository in repositories {
            match self.capture(repository, cutoff).await {
                Ok(snapshot) => reports.push(detect(&snapshot, cutoff)),
                Err(e) => error!(repository, "Skipping repository: {}", e),
            }
        }

        reports
    }

    pub async fn refresh_repo(&self, full_name: &str, days: u32) -> Result<RefreshResult> {
        let repository = TrackedRepository::parse(full_name)?;
        let cutoff = self.window().cutoff(days);
        Ok(self.refresh_one(&repository.full_name, cutoff).await)
    }

    /// Refresh every tracked repository; failures are reported per repository
    pub async fn refresh_all(&self, days: u32) -> Result<Vec<RefreshResult>> {
        let tracked = self.tracked.list().await?;
        let cutoff = self.window().cutoff(days);
        info!(count = tracked.len(), days, "Refreshing tracked repositories");

        let mut results = Vec::with_capacity(tracked.len());
        for repository in &tracked {
            results.push(self.refresh_one(&repository.full_name, cutoff).await);
        }

        let failed = results.iter().filter(|r| !r.success).count();
        if failed > 0 {
            warn!(failed, total = results.len(), "Refresh finished with failures");
        }
        Ok(results)
    }

    async fn refresh_one(&self, repository: &str, cutoff: DateTime<FixedOffset>) -> RefreshResult {
        match self.capture(repository, cutoff).await {
            Ok(snapshot) => RefreshResult {
                repository: repository.to_string(),
                success: true,
                items: snapshot.items.len(),
                captured_at: Some(snapshot.captured_at),
                error: None,
            },
            Err(e) => {
                error!(repository, "Refresh failed: {}", e);
                RefreshResult {
                    repository: repository.to_string(),
                    success: false,
                    items: 0,
                    captured_at: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Latest snapshot of one repository, filtered to the last `days` days
    pub async fn view(&self, full_name: &str, days: u32) -> Result<TrackedView> {
        let repository = TrackedRepository::parse(full_name)?;
        let cutoff = self.window().cutoff(days);
        let latest = self.snapshots.latest(&repository.full_name).await?;

        let last_updated = latest.as_ref().map(|s| s.captured_at);
        let report = latest.map(|snapshot| detect(&snapshot, cutoff));
        Ok(TrackedView::new(repository.full_name, report, last_updated))
    }

    pub async fn tracked_views(&self, days: u32) -> Result<Vec<TrackedView>> {
        let mut views = Vec::new();
        for repository in self.tracked.list().await? {
            views.push(self.view(&repository.full_name, days).await?);
        }
        Ok(views)
    }

    pub async fn tracked(&self) -> Result<Vec<TrackedRepository>> {
        Ok(self.tracked.list().await?)
    }

    /// `false` if already tracked
    pub async fn track(&self, full_name: &str) -> Result<bool> {
        let repository = TrackedRepository::parse(full_name)?;
        Ok(self.tracked.add(repository).await?)
    }

    /// `false` if it was not tracked
    pub async fn untrack(&self, full_name: &str) -> Result<bool> {
        let repository = TrackedRepository::parse(full_name)?;
        Ok(self.tracked.remove(&repository.full_name).await?)
    }
}
