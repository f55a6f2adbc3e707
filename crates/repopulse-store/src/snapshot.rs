use crate::fsutil::write_atomic;
use crate::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use repopulse_core::{
    ActivityCounts, ActivityDetail, ActivityItem, ActivitySnapshot, TimeWindow, TrackedRepository,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

const ID_TIME_FORMAT: &str = "%Y%m%dT%H%M%S%.6fZ";

/// Sortable snapshot identifier: `<UTC capture time>-<uuid v7>`.
///
/// The textual form orders the same way as the value, so the newest snapshot
/// is simply the greatest file name that parses as an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotId {
    captured: NaiveDateTime,
    nonce: Uuid,
}

impl SnapshotId {
    pub fn new(captured: DateTime<Utc>) -> Self {
        Self {
            captured: captured.naive_utc(),
            nonce: Uuid::now_v7(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || Error::InvalidSnapshotId(raw.to_string());

        let (stamp, nonce) = raw.split_once('-').ok_or_else(invalid)?;
        let captured = NaiveDateTime::parse_from_str(stamp, ID_TIME_FORMAT).map_err(|_| invalid())?;
        if nonce.len() != 32 {
            return Err(invalid());
        }
        let nonce = Uuid::try_parse(nonce).map_err(|_| invalid())?;

        Ok(Self { captured, nonce })
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.captured, Utc)
    }
}

impl std::fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}",
            self.captured.format(ID_TIME_FORMAT),
            self.nonce.simple()
        )
    }
}

/// File shape. Item timestamps stay strings so a bad record can be skipped on
/// load without losing the rest of the snapshot.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRecord {
    repository: String,
    captured_at: String,
    #[serde(default)]
    counts: ActivityCounts,
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredItem {
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    timestamp: String,
    url: String,
    #[serde(flatten)]
    detail: ActivityDetail,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title_zh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description_zh: Option<String>,
}

impl From<&ActivityItem> for StoredItem {
    fn from(item: &ActivityItem) -> Self {
        Self {
            title: item.title.clone(),
            description: item.description.clone(),
            timestamp: item.timestamp.to_rfc3339(),
            url: item.url.clone(),
            detail: item.detail.clone(),
            title_zh: item.title_zh.clone(),
            description_zh: item.description_zh.clone(),
        }
    }
}

/// Append-only per-repository snapshot history on the local filesystem:
/// `<root>/<owner>/<repo>/<SnapshotId>.json`
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
    window: TimeWindow,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>, window: TimeWindow) -> Self {
        Self {
            root: root.into(),
            window,
        }
    }

    fn repo_dir(&self, repository: &str) -> Result<PathBuf> {
        let repo = TrackedRepository::parse(repository)?;
        Ok(self.root.join(repo.owner()).join(repo.name()))
    }

    /// Persist a snapshot under a fresh id; earlier snapshots are untouched
    pub async fn save(&self, snapshot: &ActivitySnapshot) -> Result<SnapshotId> {
        let dir = self.repo_dir(&snapshot.repository)?;
        let id = SnapshotId::new(snapshot.captured_at.with_timezone(&Utc));

        let record = SnapshotRecord {
            repository: snapshot.repository.clone(),
            captured_at: snapshot.captured_at.to_rfc3339(),
            counts: snapshot.counts,
            items: snapshot
                .items
                .iter()
                .map(|item| serde_json::to_value(StoredItem::from(item)))
                .collect::<std::result::Result<_, _>>()?,
        };
        let body = serde_json::to_vec_pretty(&record)?;

        write_atomic(&dir.join(format!("{}.json", id)), &body).await?;

        debug!(
            repository = %snapshot.repository,
            snapshot_id = %id,
            items = snapshot.items.len(),
            "Snapshot saved"
        );
        Ok(id)
    }

    /// Ids of all stored snapshots for a repository, oldest first
    pub async fn history(&self, repository: &str) -> Result<Vec<SnapshotId>> {
        let dir = self.repo_dir(repository)?;

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(id) = name
                .strip_suffix(".json")
                .and_then(|stem| SnapshotId::parse(stem).ok())
            {
                ids.push(id);
            }
        }

        ids.sort();
        Ok(ids)
    }

    /// Most recent snapshot, or `None` when the repository has never been captured
    pub async fn latest(&self, repository: &str) -> Result<Option<ActivitySnapshot>> {
        let Some(id) = self.history(repository).await?.pop() else {
            return Ok(None);
        };
        self.load(repository, id).await.map(Some)
    }

    pub async fn load(&self, repository: &str, id: SnapshotId) -> Result<ActivitySnapshot> {
        let path = self.repo_dir(repository)?.join(format!("{}.json", id));
        let content = fs::read_to_string(&path).await?;
        let record: SnapshotRecord = serde_json::from_str(&content)?;

        let captured_at = self.window.parse(&record.captured_at)?;
        let items: Vec<ActivityItem> = record
            .items
            .into_iter()
            .filter_map(|value| match self.restore_item(value) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(repository = %record.repository, snapshot_id = %id, "Skipping stored item: {}", e);
                    None
                }
            })
            .collect();

        Ok(ActivitySnapshot::new(record.repository, captured_at, items))
    }

    fn restore_item(&self, value: serde_json::Value) -> Result<ActivityItem> {
        let stored: StoredItem = serde_json::from_value(value)?;
        let timestamp = self.window.parse(&stored.timestamp)?;

        let mut item = ActivityItem::new(stored.title, timestamp, stored.url, stored.detail)
            .with_description(stored.description);
        item.title_zh = stored.title_zh;
        item.description_zh = stored.description_zh;
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, FixedOffset};
    use tempfile::TempDir;

    fn at(raw: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(raw).unwrap()
    }

    fn snapshot(captured: &str, titles: &[&str]) -> ActivitySnapshot {
        let items = titles
            .iter()
            .enumerate()
            .map(|(i, title)| {
                ActivityItem::new(
                    title.to_string(),
                    at(captured) - Duration::hours(i as i64 + 1),
                    format!("https://github.com/octocat/Hello-World/issues/{}", i),
                    ActivityDetail::Issue {
                        number: i as u64,
                        state: "open".to_string(),
                    },
                )
            })
            .collect();
        ActivitySnapshot::new("octocat/Hello-World".to_string(), at(captured), items)
    }

    #[test]
    fn test_snapshot_id_text_round_trip_and_order() {
        let earlier = SnapshotId::new(at("2026-10-19T01:00:00Z").with_timezone(&Utc));
        let later = SnapshotId::new(at("2026-10-19T01:00:00.000001Z").with_timezone(&Utc));

        assert_eq!(SnapshotId::parse(&earlier.to_string()).unwrap(), earlier);
        assert!(earlier < later);
        assert!(earlier.to_string() < later.to_string());
    }

    #[test]
    fn test_snapshot_id_rejects_other_names() {
        for raw in ["latest", "20261019", "20261019T010000.000000Z-xyz", ".tmp"] {
            assert!(SnapshotId::parse(raw).is_err(), "accepted {}", raw);
        }
    }

    #[tokio::test]
    async fn test_latest_of_unknown_repository_is_none() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path(), TimeWindow::default());
        assert!(store.latest("octocat/Hello-World").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_latest_returns_newest() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path(), TimeWindow::default());

        store
            .save(&snapshot("2026-10-18T08:00:00+08:00", &["old"]))
            .await
            .unwrap();
        let newest = snapshot("2026-10-19T08:00:00+08:00", &["new-1", "new-2"]);
        store.save(&newest).await.unwrap();

        let latest = store.latest("octocat/Hello-World").await.unwrap().unwrap();
        assert_eq!(latest, newest);
        assert_eq!(store.history("octocat/Hello-World").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_foreign_files_ignored() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path(), TimeWindow::default());
        store
            .save(&snapshot("2026-10-18T08:00:00+08:00", &["kept"]))
            .await
            .unwrap();

        let repo_dir = dir.path().join("octocat").join("Hello-World");
        std::fs::write(repo_dir.join("zzz_notes.json"), "not a snapshot").unwrap();
        std::fs::write(repo_dir.join("activities_20991231.json"), "{}").unwrap();

        let latest = store.latest("octocat/Hello-World").await.unwrap().unwrap();
        assert_eq!(latest.items[0].title, "kept");
    }

    #[tokio::test]
    async fn test_malformed_stored_item_is_skipped() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path(), TimeWindow::default());
        let id = store
            .save(&snapshot("2026-10-19T08:00:00+08:00", &["good", "bad"]))
            .await
            .unwrap();

        let path = dir
            .path()
            .join("octocat")
            .join("Hello-World")
            .join(format!("{}.json", id));
        let mut record: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        record["items"][1]["timestamp"] = serde_json::json!("sometime last week");
        std::fs::write(&path, serde_json::to_vec(&record).unwrap()).unwrap();

        let loaded = store.latest("octocat/Hello-World").await.unwrap().unwrap();
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.items[0].title, "good");
        assert_eq!(loaded.counts.issues, 1);
    }

    #[tokio::test]
    async fn test_invalid_repository_name_rejected() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path(), TimeWindow::default());
        assert!(store.latest("../escape").await.is_err());
    }
}
