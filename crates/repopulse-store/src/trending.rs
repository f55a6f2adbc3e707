use crate::fsutil::write_atomic;
use crate::Result;
use chrono::{DateTime, FixedOffset};
use repopulse_core::RepoSummary;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, warn};

const FILE_PREFIX: &str = "trending_";

/// One trending capture run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingCapture {
    pub captured_at: DateTime<FixedOffset>,
    pub description: String,
    pub repositories: Vec<RepoSummary>,
}

/// Timestamped trending captures: `<dir>/trending_<YYYYmmdd_HHMMSS>.json`
#[derive(Debug, Clone)]
pub struct TrendingStore {
    dir: PathBuf,
}

impl TrendingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn save(&self, capture: &TrendingCapture) -> Result<PathBuf> {
        let name = format!(
            "{}{}.json",
            FILE_PREFIX,
            capture.captured_at.format("%Y%m%d_%H%M%S")
        );
        let path = self.dir.join(name);
        write_atomic(&path, &serde_json::to_vec_pretty(capture)?).await?;

        info!(
            path = %path.display(),
            repositories = capture.repositories.len(),
            "Trending capture saved"
        );
        Ok(path)
    }

    /// Newest readable capture, if any
    pub async fn latest(&self) -> Result<Option<TrendingCapture>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(FILE_PREFIX) && name.ends_with(".json") {
                names.push(name);
            }
        }
        names.sort();

        for name in names.iter().rev() {
            let content = fs::read_to_string(self.dir.join(name)).await?;
            match serde_json::from_str::<TrendingCapture>(&content) {
                Ok(capture) => return Ok(Some(capture)),
                Err(e) => warn!(file = %name, "Skipping unreadable trending capture: {}", e),
            }
        }
        Ok(None)
    }
}
